//! The entity-resolution cascade.
//!
//! Takes the ambiguous (title, year hint, kind hint, reference person) tuple
//! scraped for one listing and resolves it to a unique catalog identity.
//! The step order encodes decreasing confidence: exact identity evidence
//! (credits) before weak correlative evidence (year, then title text) before
//! best-guess popularity. Each step operates on the candidate set fetched in
//! step 1; only the credits scan and the final external-id enrichment issue
//! further network calls.

mod credits;
mod normalize;

pub use credits::CREDITS_VALIDATION_LIMIT;
pub use normalize::{extract_year, normalize_title};

use tracing::{debug, info, warn};

use crate::providers::CatalogProvider;
use crate::types::{CatalogCandidate, MediaKind, ReferencePerson, Resolution, ResolvedIdentity};

use credits::verify_by_credits;

/// Inputs for resolving one listing.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub title: &'a str,
    /// Raw year text from the detail page; validated against the 19xx/20xx
    /// pattern before use and never sent to the catalog.
    pub year_hint: Option<&'a str>,
    pub content_hint: MediaKind,
    pub reference_person: Option<&'a ReferencePerson>,
}

/// Runs the resolution cascade against a catalog provider.
///
/// Constructed without a provider when no catalog credentials are
/// configured; every resolution then degrades to Unresolved with no network
/// attempt.
#[derive(Debug)]
pub struct Resolver<P> {
    provider: Option<P>,
}

impl<P: CatalogProvider> Resolver<P> {
    pub fn new(provider: Option<P>) -> Self {
        Self { provider }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolve one listing. Never errors: every failure mode collapses to
    /// `Resolution::Unresolved`.
    pub async fn resolve(&self, request: ResolveRequest<'_>) -> Resolution {
        let Some(provider) = self.provider.as_ref() else {
            return Resolution::Unresolved;
        };

        // Steps 1-2: endpoint selection plus the one-shot opposite-kind
        // retry on an empty type-specific result.
        let Some((candidates, hint)) = self
            .search_candidates(provider, request.title, request.content_hint)
            .await
        else {
            return Resolution::Unresolved;
        };

        // Step 3: a single candidate is accepted outright; verification can
        // only enrich it, not reject it.
        if let [chosen] = candidates.as_slice() {
            if let Some(person) = request.reference_person {
                if let Some(identity) =
                    verify_by_credits(provider, candidates.as_slice(), person, hint).await
                {
                    debug!(
                        "single result for '{}' verified via {} credits",
                        request.title, person.role
                    );
                    return Resolution::Resolved(identity);
                }
                warn!(
                    "single result for '{}' could not be verified via {} credits, using the match anyway",
                    request.title, person.role
                );
            }
            return self.accept(provider, chosen, "single result", request.title).await;
        }

        // Step 4: credits disambiguation across the candidate set.
        if let Some(person) = request.reference_person {
            debug!(
                "checking credits for '{}' with '{}' ({}, {} candidates)",
                request.title,
                person.name,
                person.role,
                candidates.len()
            );
            if let Some(identity) =
                verify_by_credits(provider, candidates.as_slice(), person, hint).await
            {
                return Resolution::Resolved(identity);
            }
        }

        // Step 5: local year match. Credits were already tried, so no
        // re-verification here or below.
        if let Some(fragment) = request.year_hint.and_then(extract_year) {
            if let Some(candidate) = candidates.iter().find(|c| {
                c.release_date
                    .as_deref()
                    .is_some_and(|d| d.starts_with(fragment))
            }) {
                debug!(
                    "year match ({fragment}) for '{}' -> catalog id {}",
                    request.title, candidate.catalog_id
                );
                return self.accept(provider, candidate, "year match", request.title).await;
            }
        }

        // Step 6: unique normalized exact-title match.
        let normalized_query = normalize_title(request.title);
        let title_matches: Vec<&CatalogCandidate> = candidates
            .iter()
            .filter(|c| normalize_title(&c.display_title) == normalized_query)
            .collect();
        if let [only] = title_matches.as_slice() {
            return self
                .accept(provider, only, "single title match", request.title)
                .await;
        }

        // Step 7: terminal fallback, preferring an exact-title match over
        // raw popularity order.
        let Some(fallback) = title_matches.first().copied().or(candidates.first()) else {
            return Resolution::Unresolved;
        };
        info!(
            "falling back to most popular result for '{}' -> catalog id {} ('{}')",
            request.title, fallback.catalog_id, fallback.display_title
        );
        self.accept(provider, fallback, "popularity fallback", request.title)
            .await
    }

    async fn search_candidates(
        &self,
        provider: &P,
        title: &str,
        hint: MediaKind,
    ) -> Option<(Vec<CatalogCandidate>, MediaKind)> {
        let first = match provider.search(title, hint).await {
            Ok(results) => results,
            Err(err) => {
                warn!("catalog search failed for '{title}': {err}");
                return None;
            }
        };
        if !first.is_empty() {
            return Some((first, hint));
        }
        if !hint.is_concrete() {
            warn!("catalog search returned no results for '{title}'");
            return None;
        }

        let alt = hint.flipped();
        info!("no results for '{title}' as {hint}, retrying as {alt}");
        match provider.search(title, alt).await {
            Ok(results) if !results.is_empty() => Some((results, alt)),
            Ok(_) => {
                warn!("catalog search returned no results for '{title}'");
                None
            }
            Err(err) => {
                warn!("catalog search failed for '{title}': {err}");
                None
            }
        }
    }

    /// Build the identity for an accepted candidate, fetching the secondary
    /// external identifier in a follow-up call. The enrichment is
    /// best-effort: a failed lookup leaves the external id absent.
    async fn accept(
        &self,
        provider: &P,
        candidate: &CatalogCandidate,
        step: &str,
        title: &str,
    ) -> Resolution {
        debug!(
            "{step} for '{title}' -> catalog id {} ('{}')",
            candidate.catalog_id, candidate.display_title
        );
        let external_id = match provider.details(candidate.catalog_id, candidate.media_kind).await {
            Ok(details) => details.imdb_id,
            Err(err) => {
                warn!(
                    "external id lookup failed for catalog id {}: {err}",
                    candidate.catalog_id
                );
                None
            }
        };
        Resolution::Resolved(ResolvedIdentity {
            catalog_id: candidate.catalog_id,
            media_kind: candidate.media_kind,
            external_id,
            year: candidate.release_year(),
        })
    }
}
