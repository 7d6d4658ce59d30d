use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::traits::{
    CandidateDetails, CastMember, CatalogProvider, Credits, CrewMember, ProviderError,
};
use crate::limiter::RateLimiter;
use crate::retry::TransportRetry;
use crate::types::{CatalogCandidate, MediaKind};

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";

/// TMDB-backed catalog provider.
///
/// Every outbound call is admitted through the rolling-window rate limiter
/// before dispatch, and transient transport failures get a few quick
/// retries. The API key travels as a query parameter attached per request
/// so it never appears in URL string literals.
pub struct TmdbProvider {
    api_key: String,
    client: Client,
    limiter: RateLimiter,
    transport: TransportRetry,
}

impl fmt::Debug for TmdbProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbProvider").finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResult {
    id: u64,
    title: Option<String>,
    name: Option<String>, // TV shows use "name" instead of "title"
    release_date: Option<String>,
    first_air_date: Option<String>,
    media_type: Option<String>, // only present on /search/multi results
}

#[derive(Debug, Deserialize)]
struct TmdbDetailsResponse {
    #[serde(default)]
    credits: TmdbCredits,
    #[serde(default)]
    external_ids: TmdbExternalIds,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbPerson>,
    #[serde(default)]
    crew: Vec<TmdbPerson>,
}

#[derive(Debug, Deserialize)]
struct TmdbPerson {
    name: String,
    character: Option<String>,
    job: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

fn year_prefix(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.parse().ok())
}

impl TmdbProvider {
    pub fn new(api_key: String, timeout: Duration) -> std::result::Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            client,
            limiter: RateLimiter::for_tmdb(),
            transport: TransportRetry::default(),
        })
    }

    fn detail_endpoint(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "movie",
            MediaKind::Series | MediaKind::Unknown => "tv",
        }
    }

    fn candidate_from_result(result: TmdbSearchResult, endpoint_kind: MediaKind) -> CatalogCandidate {
        let kind = match result.media_type.as_deref() {
            Some("movie") => MediaKind::Movie,
            Some("tv") => MediaKind::Series,
            _ => endpoint_kind,
        };
        let display_title = result
            .title
            .or(result.name)
            .unwrap_or_else(|| "Unknown".to_string());
        CatalogCandidate {
            catalog_id: result.id,
            media_kind: kind,
            display_title,
            release_date: result.release_date.or(result.first_air_date),
        }
    }
}

#[async_trait]
impl CatalogProvider for TmdbProvider {
    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> std::result::Result<Vec<CatalogCandidate>, ProviderError> {
        let endpoint = match kind {
            MediaKind::Movie => "search/movie",
            MediaKind::Series => "search/tv",
            MediaKind::Unknown => "search/multi",
        };
        let url = format!("{TMDB_API_BASE}/{endpoint}");

        self.limiter.admit().await;
        let response = self
            .transport
            .send(
                self.client
                    .get(&url)
                    .query(&[("api_key", self.api_key.as_str()), ("query", title)]),
            )
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::InvalidApiKey);
        }
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "TMDB search returned status {}",
                response.status()
            )));
        }

        let parsed: TmdbSearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        debug!(
            "TMDB {endpoint} returned {} results for '{title}'",
            parsed.results.len()
        );

        // Multi search interleaves people with media; only Movie/Series
        // results are candidates.
        Ok(parsed
            .results
            .into_iter()
            .filter(|r| {
                kind.is_concrete() || matches!(r.media_type.as_deref(), Some("movie") | Some("tv"))
            })
            .map(|r| Self::candidate_from_result(r, kind))
            .collect())
    }

    async fn details(
        &self,
        catalog_id: u64,
        kind: MediaKind,
    ) -> std::result::Result<CandidateDetails, ProviderError> {
        let endpoint = Self::detail_endpoint(kind);
        let url = format!("{TMDB_API_BASE}/{endpoint}/{catalog_id}");

        self.limiter.admit().await;
        let response = self
            .transport
            .send(self.client.get(&url).query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", "credits,external_ids"),
            ]))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::InvalidApiKey);
        }
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "TMDB details returned status {}",
                response.status()
            )));
        }

        let parsed: TmdbDetailsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let release_year =
            year_prefix(parsed.release_date.as_deref().or(parsed.first_air_date.as_deref()));

        Ok(CandidateDetails {
            credits: Credits {
                cast: parsed
                    .credits
                    .cast
                    .into_iter()
                    .map(|p| CastMember {
                        name: p.name,
                        character: p.character,
                    })
                    .collect(),
                crew: parsed
                    .credits
                    .crew
                    .into_iter()
                    .map(|p| CrewMember {
                        name: p.name,
                        job: p.job,
                    })
                    .collect(),
            },
            imdb_id: parsed.external_ids.imdb_id,
            release_year,
        })
    }
}
