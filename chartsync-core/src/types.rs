//! Shared domain types for chart ingestion and entity resolution.

use serde::{Deserialize, Serialize};

/// Kind of media a listing or catalog entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Series,
    Unknown,
}

impl MediaKind {
    /// Whether this is a concrete (non-Unknown) kind.
    pub fn is_concrete(self) -> bool {
        !matches!(self, MediaKind::Unknown)
    }

    /// The opposite concrete kind, used for the empty-result retry flip.
    /// Unknown has no opposite and is returned unchanged.
    pub fn flipped(self) -> Self {
        match self {
            MediaKind::Movie => MediaKind::Series,
            MediaKind::Series => MediaKind::Movie,
            MediaKind::Unknown => MediaKind::Unknown,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
            MediaKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One ranked row scraped from a chart page.
///
/// `slug` is the source site's own identifier. It is only ever used to fetch
/// the source's detail page and to score destination text-search results;
/// it is never sent to the catalog as a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    /// 1-based chart position.
    pub rank: u32,
    /// Display title as shown on the chart.
    pub title: String,
    /// Source-site URL slug for the title's detail page.
    pub slug: String,
    /// Movie/Series hint derived from the section the row came from.
    pub content_hint: MediaKind,
}

/// Where on the source page a reference person's name was found.
///
/// This is a hint about the label the name appeared under, not a constraint
/// on how the catalog classifies the person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonRole {
    Cast,
    Director,
    Producer,
}

impl std::fmt::Display for PersonRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PersonRole::Cast => "cast",
            PersonRole::Director => "director",
            PersonRole::Producer => "producer",
        };
        f.write_str(label)
    }
}

/// A credited person extracted from the source's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePerson {
    pub name: String,
    pub role: PersonRole,
}

/// Enrichment signals scraped from a listing's detail page.
///
/// Everything here is best-effort: any field may be absent, and `year` may be
/// malformed free text that must be validated against a 4-digit 19xx/20xx
/// pattern before use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailSignals {
    /// Raw premiere text, e.g. "Nov 28, 2023". Validated at use.
    pub year: Option<String>,
    /// First person found under the ordered label list.
    pub reference_person: Option<ReferencePerson>,
    /// Secondary Movie/Series signal, consulted only when the section gave
    /// no content hint.
    pub detail_media_kind: Option<MediaKind>,
}

/// One result from a catalog search, in the catalog's relevance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCandidate {
    pub catalog_id: u64,
    pub media_kind: MediaKind,
    pub display_title: String,
    /// Release date (movies) or first-air date (series), "YYYY-MM-DD".
    pub release_date: Option<String>,
}

impl CatalogCandidate {
    /// The 4-digit year prefix of the release date, if parseable.
    pub fn release_year(&self) -> Option<u16> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

/// The catalog identity a listing resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub catalog_id: u64,
    pub media_kind: MediaKind,
    /// Secondary external identifier (IMDb), fetched in a follow-up call.
    pub external_id: Option<String>,
    pub year: Option<u16>,
}

/// Outcome of running the resolution cascade for one listing.
///
/// Unresolved is a first-class state: payload building filters on it rather
/// than treating it as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedIdentity),
    #[default]
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn identity(&self) -> Option<&ResolvedIdentity> {
        match self {
            Resolution::Resolved(identity) => Some(identity),
            Resolution::Unresolved => None,
        }
    }
}

/// A chart row together with its enrichment signals and resolution outcome.
#[derive(Debug, Clone)]
pub struct ResolvedListing {
    pub listing: RawListing,
    pub signals: DetailSignals,
    pub resolution: Resolution,
}
