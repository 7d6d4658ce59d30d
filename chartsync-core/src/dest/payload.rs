//! Destination list payloads.
//!
//! Converts a section's resolved rows into the destination's replace-list
//! payload shape, partitioned by kind. Lookups prefer the already-known
//! catalog identifier and fall back to free-text search; rows that fail both
//! paths are omitted without aborting the batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::DestinationError;
use crate::types::{MediaKind, ResolvedListing};

/// Media kind in the destination's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraktKind {
    Movie,
    Show,
}

impl TraktKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TraktKind::Movie => "movie",
            TraktKind::Show => "show",
        }
    }

    pub fn from_media_kind(kind: MediaKind) -> Option<Self> {
        match kind {
            MediaKind::Movie => Some(TraktKind::Movie),
            MediaKind::Series => Some(TraktKind::Show),
            MediaKind::Unknown => None,
        }
    }
}

impl std::fmt::Display for TraktKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryIds {
    pub trakt: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub ids: EntryIds,
}

/// Payload for the destination's add/remove list-items calls, partitioned by
/// kind. An empty payload is a valid, distinct state meaning "skip the sync,
/// leave the live list alone".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPayload {
    pub movies: Vec<ListEntry>,
    pub shows: Vec<ListEntry>,
}

impl ListPayload {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.shows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movies.len() + self.shows.len()
    }

    pub fn push(&mut self, kind: TraktKind, trakt_id: u64) {
        let entry = ListEntry {
            ids: EntryIds { trakt: trakt_id },
        };
        match kind {
            TraktKind::Movie => self.movies.push(entry),
            TraktKind::Show => self.shows.push(entry),
        }
    }
}

/// Destination-side lookups used while building payloads.
#[async_trait]
pub trait DestinationSearch {
    /// Look up an item by its TMDB id, optionally filtered to one kind.
    async fn search_by_tmdb_id(
        &self,
        tmdb_id: u64,
        kind: Option<TraktKind>,
    ) -> std::result::Result<Option<(TraktKind, u64)>, DestinationError>;

    /// Free-text title search. `slug` is the source-site slug, used only to
    /// score results against the query.
    async fn search_text(
        &self,
        title: &str,
        slug: &str,
        kind: Option<TraktKind>,
    ) -> std::result::Result<Option<(TraktKind, u64)>, DestinationError>;
}

fn hit_or_miss(
    result: std::result::Result<Option<(TraktKind, u64)>, DestinationError>,
    title: &str,
    what: &str,
) -> Option<(TraktKind, u64)> {
    match result {
        Ok(hit) => hit,
        Err(err) => {
            warn!("destination {what} failed for '{title}': {err}");
            None
        }
    }
}

/// Build the payload for a single-kind list (a movies list or a shows list).
pub async fn build_single_kind_payload<D: DestinationSearch>(
    dest: &D,
    rows: &[ResolvedListing],
    kind: TraktKind,
) -> ListPayload {
    let mut payload = ListPayload::default();

    for row in rows {
        let title = row.listing.title.as_str();
        let mut hit = None;

        if let Some(identity) = row.resolution.identity() {
            hit = hit_or_miss(
                dest.search_by_tmdb_id(identity.catalog_id, Some(kind)).await,
                title,
                "id search",
            );
        }
        if hit.is_none() {
            debug!("falling back to text search for '{title}'");
            hit = hit_or_miss(
                dest.search_text(title, &row.listing.slug, Some(kind)).await,
                title,
                "text search",
            );
        }

        match hit {
            Some((_, trakt_id)) => payload.push(kind, trakt_id),
            // Failing both paths omits the row; the batch continues.
            None => warn!("no destination match for '{title}', omitting"),
        }
    }

    payload
}

/// Build the payload for a mixed-kind list.
///
/// The kind-filtered id lookup runs first when the resolution carries a
/// concrete kind: movie and series ids share a numeric space at the catalog,
/// and an unfiltered lookup can hit the wrong one.
pub async fn build_mixed_payload<D: DestinationSearch>(
    dest: &D,
    rows: &[ResolvedListing],
) -> ListPayload {
    let mut payload = ListPayload::default();

    for row in rows {
        let title = row.listing.title.as_str();
        let mut hit = None;

        if let Some(identity) = row.resolution.identity() {
            if let Some(kind) = TraktKind::from_media_kind(identity.media_kind) {
                hit = hit_or_miss(
                    dest.search_by_tmdb_id(identity.catalog_id, Some(kind)).await,
                    title,
                    "typed id search",
                );
            }
            if hit.is_none() {
                hit = hit_or_miss(
                    dest.search_by_tmdb_id(identity.catalog_id, None).await,
                    title,
                    "id search",
                );
            }
        }
        if hit.is_none() {
            debug!("falling back to text search for '{title}'");
            hit = hit_or_miss(
                dest.search_text(title, &row.listing.slug, None).await,
                title,
                "text search",
            );
        }

        match hit {
            Some((kind, trakt_id)) => payload.push(kind, trakt_id),
            None => warn!("no destination match for '{title}', omitting"),
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::types::{DetailSignals, RawListing, Resolution, ResolvedIdentity};

    use super::*;

    #[derive(Debug, Default)]
    struct MockDestination {
        by_tmdb_id: HashMap<(u64, Option<&'static str>), (TraktKind, u64)>,
        by_text: HashMap<String, (TraktKind, u64)>,
        id_calls: Mutex<Vec<(u64, Option<TraktKind>)>>,
        text_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DestinationSearch for MockDestination {
        async fn search_by_tmdb_id(
            &self,
            tmdb_id: u64,
            kind: Option<TraktKind>,
        ) -> std::result::Result<Option<(TraktKind, u64)>, DestinationError> {
            self.id_calls.lock().unwrap().push((tmdb_id, kind));
            Ok(self
                .by_tmdb_id
                .get(&(tmdb_id, kind.map(TraktKind::as_str)))
                .copied())
        }

        async fn search_text(
            &self,
            title: &str,
            _slug: &str,
            _kind: Option<TraktKind>,
        ) -> std::result::Result<Option<(TraktKind, u64)>, DestinationError> {
            self.text_calls.lock().unwrap().push(title.to_string());
            Ok(self.by_text.get(title).copied())
        }
    }

    fn row(rank: u32, title: &str, resolution: Resolution) -> ResolvedListing {
        ResolvedListing {
            listing: RawListing {
                rank,
                title: title.to_string(),
                slug: title.to_lowercase().replace(' ', "-"),
                content_hint: MediaKind::Movie,
            },
            signals: DetailSignals::default(),
            resolution,
        }
    }

    fn resolved(catalog_id: u64, kind: MediaKind) -> Resolution {
        Resolution::Resolved(ResolvedIdentity {
            catalog_id,
            media_kind: kind,
            external_id: None,
            year: None,
        })
    }

    #[tokio::test]
    async fn test_single_kind_prefers_id_lookup() {
        let mut dest = MockDestination::default();
        dest.by_tmdb_id
            .insert((872585, Some("movie")), (TraktKind::Movie, 190430));
        let rows = vec![row(1, "Oppenheimer", resolved(872585, MediaKind::Movie))];

        let payload = build_single_kind_payload(&dest, &rows, TraktKind::Movie).await;

        assert_eq!(payload.movies.len(), 1);
        assert_eq!(payload.movies[0].ids.trakt, 190430);
        assert!(dest.text_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_kind_falls_back_to_text_search() {
        let mut dest = MockDestination::default();
        dest.by_text
            .insert("Oppenheimer".to_string(), (TraktKind::Movie, 190430));
        let rows = vec![
            row(1, "Oppenheimer", resolved(872585, MediaKind::Movie)),
            row(2, "Unresolvable", Resolution::Unresolved),
        ];

        let payload = build_single_kind_payload(&dest, &rows, TraktKind::Movie).await;

        // The resolved row misses the id index and lands via text search;
        // the unresolved row goes straight to text search and is omitted.
        assert_eq!(payload.movies.len(), 1);
        assert_eq!(
            dest.text_calls.lock().unwrap().as_slice(),
            ["Oppenheimer", "Unresolvable"]
        );
    }

    #[tokio::test]
    async fn test_single_kind_omits_rows_failing_both_paths() {
        let dest = MockDestination::default();
        let rows = vec![
            row(1, "Ghost Entry", resolved(1, MediaKind::Movie)),
            row(2, "Another Ghost", Resolution::Unresolved),
        ];

        let payload = build_single_kind_payload(&dest, &rows, TraktKind::Movie).await;
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_payload_partitions_by_kind() {
        let mut dest = MockDestination::default();
        dest.by_tmdb_id
            .insert((872585, Some("movie")), (TraktKind::Movie, 190430));
        dest.by_tmdb_id
            .insert((119051, Some("show")), (TraktKind::Show, 180770));
        let rows = vec![
            row(1, "Oppenheimer", resolved(872585, MediaKind::Movie)),
            row(2, "Wednesday", resolved(119051, MediaKind::Series)),
        ];

        let payload = build_mixed_payload(&dest, &rows).await;

        assert_eq!(payload.movies.len(), 1);
        assert_eq!(payload.shows.len(), 1);
        assert_eq!(payload.shows[0].ids.trakt, 180770);
    }

    #[tokio::test]
    async fn test_mixed_payload_tries_typed_then_untyped_then_text() {
        let mut dest = MockDestination::default();
        dest.by_tmdb_id.insert((42, None), (TraktKind::Show, 777));
        let rows = vec![row(1, "Some Show", resolved(42, MediaKind::Series))];

        let payload = build_mixed_payload(&dest, &rows).await;

        assert_eq!(payload.shows.len(), 1);
        let calls = dest.id_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(42, Some(TraktKind::Show)), (42, None)]);
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_payload() {
        let dest = MockDestination::default();
        let rows: Vec<ResolvedListing> = (1..=10)
            .map(|rank| row(rank, &format!("Entry {rank}"), Resolution::Unresolved))
            .collect();

        let payload = build_mixed_payload(&dest, &rows).await;
        assert!(payload.is_empty());
        assert_eq!(payload.len(), 0);
    }
}
