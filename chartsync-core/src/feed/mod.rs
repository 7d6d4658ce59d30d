//! Chart source feed.
//!
//! The sync runner consumes ordered [`RawListing`] sequences per
//! (service, section) pair through the [`ChartFeed`] trait; the FlixPatrol
//! implementation lives in [`flixpatrol`]. The outcome type keeps "section
//! legitimately absent" distinct from "page unreachable" so the run summary
//! can report failures by name.

mod flixpatrol;

pub use flixpatrol::{diagnose_page, FlixPatrolFeed, FLIXPATROL_BASE};

use async_trait::async_trait;

use crate::types::{DetailSignals, MediaKind, RawListing};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("page returned status {0}")]
    Status(u16),
}

/// Result of fetching one chart section.
#[derive(Debug)]
pub enum SectionOutcome {
    /// Rows in chart order. Empty when the page was readable but the
    /// section (or its expected structure) was not present.
    Listings(Vec<RawListing>),
    /// The page itself could not be retrieved.
    Failed(FeedError),
}

/// Source of ranked chart listings and per-listing detail signals.
#[async_trait]
pub trait ChartFeed {
    /// Fetch one section of a chart page. Never errors: failures are folded
    /// into [`SectionOutcome::Failed`].
    async fn fetch_section(&mut self, url: &str, section_title: &str) -> SectionOutcome;

    /// Fetch enrichment signals for one listing's detail page. Best-effort:
    /// any failure yields empty signals.
    async fn detail_signals(&mut self, slug: &str) -> DetailSignals;
}

/// Derive the content hint from a section title.
///
/// "TOP 10 Movies" / "TOP 10 Kids Movies" carry a Movie hint, the TV-show
/// sections a Series hint, and the mixed "TOP 10 Overall" section none.
pub fn content_hint_from_section(section_title: &str) -> MediaKind {
    let lower = section_title.to_lowercase();
    if lower.contains("movie") {
        MediaKind::Movie
    } else if lower.contains("tv show") {
        MediaKind::Series
    } else {
        MediaKind::Unknown
    }
}
