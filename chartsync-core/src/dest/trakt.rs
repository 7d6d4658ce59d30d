//! Trakt destination client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::payload::{DestinationSearch, ListPayload, TraktKind};
use super::DestinationError;
use crate::retry::WriteOutcome;

const TRAKT_API_BASE: &str = "https://api.trakt.tv";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// Body for creating a destination list.
#[derive(Debug, Clone, Serialize)]
pub struct ListDefinition {
    pub name: String,
    pub description: String,
    pub privacy: String,
    pub display_numbers: bool,
}

#[derive(Debug, Deserialize)]
pub struct UserList {
    pub ids: UserListIds,
}

#[derive(Debug, Deserialize)]
pub struct UserListIds {
    pub trakt: u64,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "type")]
    kind: String,
    movie: Option<SearchItem>,
    show: Option<SearchItem>,
}

impl SearchResult {
    /// The (kind, item) pair for movie/show results; None for people and
    /// other result types that can share a numeric id.
    fn media_item(&self) -> Option<(TraktKind, &SearchItem)> {
        match self.kind.as_str() {
            "movie" => self.movie.as_ref().map(|item| (TraktKind::Movie, item)),
            "show" => self.show.as_ref().map(|item| (TraktKind::Show, item)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: Option<String>,
    ids: SearchItemIds,
}

#[derive(Debug, Deserialize)]
struct SearchItemIds {
    trakt: u64,
    #[serde(default)]
    slug: Option<String>,
}

/// Whether a listing slug and a destination result slug look like the same
/// title, comparing with dashes stripped: containment or a prefix relation
/// in either direction.
fn slugs_related(listing_slug: &str, result_slug: &str) -> bool {
    let tag = listing_slug.replace('-', "");
    let slug = result_slug.replace('-', "");
    slug.contains(&tag) || tag.starts_with(&slug) || slug.starts_with(&tag)
}

/// Client for the destination list service.
///
/// Auth travels via default headers: bearer token plus the api-key pair the
/// service requires on every call.
pub struct TraktClient {
    client: Client,
}

impl fmt::Debug for TraktClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraktClient").finish_non_exhaustive()
    }
}

impl TraktClient {
    pub fn new(
        client_id: &str,
        access_token: &str,
        timeout: Duration,
    ) -> std::result::Result<Self, DestinationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| DestinationError::InvalidCredential)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("trakt-api-version", HeaderValue::from_static("2"));
        headers.insert(
            "trakt-api-key",
            HeaderValue::from_str(client_id).map_err(|_| DestinationError::InvalidCredential)?,
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Validate the access token. Called once per run, before any write.
    pub async fn check_token(&self) -> std::result::Result<(), DestinationError> {
        let response = self
            .client
            .get(format!("{TRAKT_API_BASE}/users/me"))
            .send()
            .await?;
        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(DestinationError::Status(response.status().as_u16()))
        }
    }

    pub async fn get_lists(&self) -> std::result::Result<Vec<UserList>, DestinationError> {
        let response = self
            .client
            .get(format!("{TRAKT_API_BASE}/users/me/lists"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DestinationError::Status(response.status().as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| DestinationError::Parse(e.to_string()))
    }

    pub async fn create_list(
        &self,
        definition: &ListDefinition,
    ) -> std::result::Result<WriteOutcome, DestinationError> {
        let response = self
            .client
            .post(format!("{TRAKT_API_BASE}/users/me/lists"))
            .json(definition)
            .send()
            .await?;
        if response.status() == StatusCode::CREATED {
            info!("list '{}' created successfully", definition.name);
        }
        Ok(WriteOutcome::Status(response.status().as_u16()))
    }

    /// Current list contents, shaped as a removal payload.
    pub async fn get_list_items(
        &self,
        slug: &str,
    ) -> std::result::Result<ListPayload, DestinationError> {
        let response = self
            .client
            .get(format!("{TRAKT_API_BASE}/users/me/lists/{slug}/items"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DestinationError::Status(response.status().as_u16()));
        }
        let items: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| DestinationError::Parse(e.to_string()))?;

        let mut payload = ListPayload::default();
        for item in &items {
            if let Some((kind, entry)) = item.media_item() {
                payload.push(kind, entry.ids.trakt);
            }
        }
        Ok(payload)
    }

    /// Replace the contents of a list with `payload`.
    ///
    /// An empty payload short-circuits to the already-satisfied sentinel
    /// without touching the live list: emptying it and repopulating with
    /// nothing would wipe a working list on a bad scrape day.
    pub async fn update_list(
        &self,
        slug: &str,
        payload: &ListPayload,
    ) -> std::result::Result<WriteOutcome, DestinationError> {
        if payload.is_empty() {
            warn!("payload is empty, no items to add on list {slug}");
            return Ok(WriteOutcome::AlreadySatisfied);
        }

        let current = self.get_list_items(slug).await?;
        if !current.is_empty() {
            debug!("emptying list {slug} ({} items)", current.len());
            self.client
                .post(format!("{TRAKT_API_BASE}/users/me/lists/{slug}/items/remove"))
                .json(&current)
                .send()
                .await?;
        }

        info!("updating list {slug} with {} items", payload.len());
        let response = self
            .client
            .post(format!("{TRAKT_API_BASE}/users/me/lists/{slug}/items"))
            .json(payload)
            .send()
            .await?;
        Ok(WriteOutcome::Status(response.status().as_u16()))
    }
}

#[async_trait]
impl DestinationSearch for TraktClient {
    async fn search_by_tmdb_id(
        &self,
        tmdb_id: u64,
        kind: Option<TraktKind>,
    ) -> std::result::Result<Option<(TraktKind, u64)>, DestinationError> {
        let mut request = self
            .client
            .get(format!("{TRAKT_API_BASE}/search/tmdb/{tmdb_id}"));
        if let Some(kind) = kind {
            request = request.query(&[("type", kind.as_str())]);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            warn!(
                "destination id search failed (status {}) for TMDB id {tmdb_id}",
                response.status()
            );
            return Ok(None);
        }
        let results: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| DestinationError::Parse(e.to_string()))?;

        // TMDB ids can also match people; take the first movie/show result
        // (of the requested kind, when filtered).
        for result in &results {
            if let Some((found_kind, item)) = result.media_item() {
                if kind.is_none() || kind == Some(found_kind) {
                    debug!(
                        "found destination id {} ({found_kind}) via TMDB id {tmdb_id}",
                        item.ids.trakt
                    );
                    return Ok(Some((found_kind, item.ids.trakt)));
                }
            }
        }
        debug!("no {:?} results for TMDB id {tmdb_id}", kind);
        Ok(None)
    }

    async fn search_text(
        &self,
        title: &str,
        slug: &str,
        kind: Option<TraktKind>,
    ) -> std::result::Result<Option<(TraktKind, u64)>, DestinationError> {
        let query_title = title.replace('&', "and");
        let endpoint = match kind {
            Some(kind) => format!("{TRAKT_API_BASE}/search/{}", kind.as_str()),
            None => format!("{TRAKT_API_BASE}/search/movie,show"),
        };
        let response = self
            .client
            .get(endpoint)
            .query(&[("query", query_title.as_str()), ("extended", "full")])
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(
                "destination text search failed (status {}) for '{title}'",
                response.status()
            );
            return Ok(None);
        }
        let results: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| DestinationError::Parse(e.to_string()))?;

        for result in &results {
            let Some((found_kind, item)) = result.media_item() else {
                continue;
            };
            if let Some(kind) = kind {
                if found_kind != kind {
                    continue;
                }
            }
            let result_slug = item.ids.slug.as_deref().unwrap_or_default();
            if slugs_related(slug, result_slug) {
                debug!(
                    "matched '{query_title}' to destination id {} via slug '{result_slug}'",
                    item.ids.trakt
                );
                return Ok(Some((found_kind, item.ids.trakt)));
            }
        }

        // No slug-related result: fall back to the first media result.
        if let Some((found_kind, item)) = results.iter().find_map(SearchResult::media_item) {
            warn!(
                "title not found: '{title}', will add first result '{}'",
                item.title.as_deref().unwrap_or("?")
            );
            return Ok(Some((found_kind, item.ids.trakt)));
        }

        warn!("no results found for title '{title}'");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs_related() {
        assert!(slugs_related("oppenheimer", "oppenheimer"));
        assert!(slugs_related("dune-part-two", "dune-part-two"));
        // Source slugs often carry a numeric suffix the destination lacks.
        assert!(slugs_related("wednesday-2022", "wednesday"));
        // Or the destination slug is the longer one.
        assert!(slugs_related("oppenheimer", "oppenheimer-2023"));
        assert!(!slugs_related("oppenheimer", "barbie"));
    }

    #[test]
    fn test_search_result_skips_people() {
        let result = SearchResult {
            kind: "person".to_string(),
            movie: None,
            show: None,
        };
        assert!(result.media_item().is_none());
    }

    #[test]
    fn test_list_definition_serializes_to_wire_shape() {
        let definition = ListDefinition {
            name: "Top Portugal Netflix Movies".to_string(),
            description: "Updated daily".to_string(),
            privacy: "public".to_string(),
            display_numbers: true,
        };
        let value = serde_json::to_value(&definition).unwrap();
        assert_eq!(value["privacy"], "public");
        assert_eq!(value["display_numbers"], true);
    }

    #[tokio::test]
    async fn test_update_list_skips_empty_payload_without_network() {
        // Bogus credentials: any network attempt would fail, so a clean
        // AlreadySatisfied proves the live list was never touched.
        let client =
            TraktClient::new("client-id", "token", Duration::from_millis(10)).unwrap();
        let outcome = client
            .update_list("top-portugal-netflix-movies", &ListPayload::default())
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::AlreadySatisfied);
    }
}
