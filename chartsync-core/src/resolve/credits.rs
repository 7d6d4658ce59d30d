//! Credits-based candidate verification.
//!
//! Disambiguates among catalog candidates by checking whether the reference
//! person scraped from the source page appears in a candidate's cast or crew.

use tracing::{debug, info, warn};

use crate::providers::{CandidateDetails, CatalogProvider, Credits, ProviderError};
use crate::types::{CatalogCandidate, MediaKind, ReferencePerson, ResolvedIdentity};

/// Maximum number of candidates checked via the credits endpoint.
pub const CREDITS_VALIDATION_LIMIT: usize = 20;

/// Whether the person appears anywhere in the credits, cast or crew.
///
/// Both lists are searched regardless of the role label the name was found
/// under on the source page: that label says where the name appeared, not
/// how the catalog classifies the person. The match is a case-insensitive
/// bidirectional substring test, preserved as-is from the source behavior;
/// short or one-word names can false-positive against unrelated members.
fn person_in_credits(credits: &Credits, person_lower: &str) -> bool {
    let matches = |name: &str| {
        let member = name.to_lowercase();
        member.contains(person_lower) || person_lower.contains(member.as_str())
    };
    credits.cast.iter().any(|m| matches(&m.name))
        || credits.crew.iter().any(|m| matches(&m.name))
}

fn enriched_identity(
    candidate: &CatalogCandidate,
    kind: MediaKind,
    details: &CandidateDetails,
) -> ResolvedIdentity {
    ResolvedIdentity {
        catalog_id: candidate.catalog_id,
        media_kind: kind,
        external_id: details.imdb_id.clone(),
        year: candidate.release_year().or(details.release_year),
    }
}

/// Scan up to [`CREDITS_VALIDATION_LIMIT`] candidates, in the catalog's
/// relevance order, for one whose credits contain the reference person.
///
/// Returns the enriched identity of the first match and stops scanning.
/// A failed detail fetch for one candidate is logged and treated as "no
/// match for this candidate"; the scan simply moves on.
pub(super) async fn verify_by_credits<P: CatalogProvider>(
    provider: &P,
    candidates: &[CatalogCandidate],
    person: &ReferencePerson,
    content_hint: MediaKind,
) -> Option<ResolvedIdentity> {
    let person_lower = person.name.to_lowercase();

    for candidate in candidates.iter().take(CREDITS_VALIDATION_LIMIT) {
        // Endpoint preference: the candidate's own declared kind, else the
        // section hint, else Movie.
        let endpoint_kind = if candidate.media_kind.is_concrete() {
            candidate.media_kind
        } else if content_hint.is_concrete() {
            content_hint
        } else {
            MediaKind::Movie
        };

        match provider.details(candidate.catalog_id, endpoint_kind).await {
            Ok(details) => {
                if person_in_credits(&details.credits, &person_lower) {
                    debug!(
                        "credits match: found '{}' ({}) in catalog id {} ('{}')",
                        person.name, person.role, candidate.catalog_id, candidate.display_title
                    );
                    return Some(enriched_identity(candidate, endpoint_kind, &details));
                }
            }
            Err(ProviderError::NotFound)
                if endpoint_kind == MediaKind::Movie && content_hint == MediaKind::Unknown =>
            {
                // Mixed/overall rows carry no hint; a 404 on the movie
                // endpoint may just mean the id names a series.
                match provider.details(candidate.catalog_id, MediaKind::Series).await {
                    Ok(details) => {
                        if person_in_credits(&details.credits, &person_lower) {
                            info!(
                                "credits match (series retry): found '{}' ({}) in catalog id {} ('{}')",
                                person.name,
                                person.role,
                                candidate.catalog_id,
                                candidate.display_title
                            );
                            return Some(enriched_identity(
                                candidate,
                                MediaKind::Series,
                                &details,
                            ));
                        }
                    }
                    Err(err) => {
                        warn!(
                            "credits check failed for catalog id {} on series retry: {err}",
                            candidate.catalog_id
                        );
                    }
                }
            }
            Err(err) => {
                warn!(
                    "credits check failed for catalog id {}: {err}",
                    candidate.catalog_id
                );
            }
        }
    }

    None
}
