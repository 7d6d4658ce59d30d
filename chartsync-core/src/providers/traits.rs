use async_trait::async_trait;

use crate::types::{CatalogCandidate, MediaKind};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CrewMember {
    pub name: String,
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Credits {
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
}

/// Detail record for one candidate: embedded credits plus the secondary
/// external identifier.
#[derive(Debug, Clone, Default)]
pub struct CandidateDetails {
    pub credits: Credits,
    pub imdb_id: Option<String>,
    pub release_year: Option<u16>,
}

/// Search/detail access to the media catalog.
///
/// The resolution cascade only talks to the catalog through this trait so
/// that the matching steps can be exercised against canned candidate sets.
#[async_trait]
pub trait CatalogProvider {
    /// Search for candidates matching `title`, in the catalog's relevance
    /// order. `kind` Movie/Series selects the type-specific endpoint;
    /// Unknown selects the combined multi search (with non-media results
    /// already filtered out). The query never carries a year.
    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> std::result::Result<Vec<CatalogCandidate>, ProviderError>;

    /// Fetch details (credits + external ids) for one catalog id via the
    /// endpoint for `kind`. `kind` must be concrete; Unknown falls back to
    /// the Series endpoint, matching the id-to-details call of the original
    /// deployment.
    async fn details(
        &self,
        catalog_id: u64,
        kind: MediaKind,
    ) -> std::result::Result<CandidateDetails, ProviderError>;
}
