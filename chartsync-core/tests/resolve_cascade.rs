//! End-to-end cascade scenarios against a canned catalog.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use chartsync_core::providers::{
    CandidateDetails, CastMember, CatalogProvider, Credits, CrewMember, ProviderError,
};
use chartsync_core::resolve::{ResolveRequest, Resolver};
use chartsync_core::types::{
    CatalogCandidate, MediaKind, PersonRole, ReferencePerson, Resolution,
};

#[derive(Debug, Default)]
struct CannedCatalog {
    searches: HashMap<(String, MediaKind), Vec<CatalogCandidate>>,
    details: HashMap<(u64, MediaKind), CandidateDetails>,
    detail_calls: Mutex<Vec<(u64, MediaKind)>>,
}

impl CannedCatalog {
    fn with_search(
        mut self,
        title: &str,
        kind: MediaKind,
        results: Vec<CatalogCandidate>,
    ) -> Self {
        self.searches.insert((title.to_string(), kind), results);
        self
    }

    fn with_details(mut self, id: u64, kind: MediaKind, details: CandidateDetails) -> Self {
        self.details.insert((id, kind), details);
        self
    }
}

#[async_trait]
impl CatalogProvider for CannedCatalog {
    async fn search(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> Result<Vec<CatalogCandidate>, ProviderError> {
        Ok(self
            .searches
            .get(&(title.to_string(), kind))
            .cloned()
            .unwrap_or_default())
    }

    async fn details(
        &self,
        catalog_id: u64,
        kind: MediaKind,
    ) -> Result<CandidateDetails, ProviderError> {
        self.detail_calls.lock().unwrap().push((catalog_id, kind));
        self.details
            .get(&(catalog_id, kind))
            .cloned()
            .ok_or(ProviderError::NotFound)
    }
}

fn movie(id: u64, title: &str, date: &str) -> CatalogCandidate {
    CatalogCandidate {
        catalog_id: id,
        media_kind: MediaKind::Movie,
        display_title: title.to_string(),
        release_date: Some(date.to_string()),
    }
}

fn details(cast: &[&str], crew: &[&str], imdb_id: Option<&str>, year: Option<u16>) -> CandidateDetails {
    CandidateDetails {
        credits: Credits {
            cast: cast
                .iter()
                .map(|name| CastMember {
                    name: name.to_string(),
                    character: None,
                })
                .collect(),
            crew: crew
                .iter()
                .map(|name| CrewMember {
                    name: name.to_string(),
                    job: None,
                })
                .collect(),
        },
        imdb_id: imdb_id.map(str::to_string),
        release_year: year,
    }
}

/// The reference scenario: a ranked movie row with a year and a credited
/// actor, two catalog candidates, and a credits check that confirms the
/// newer one.
#[tokio::test]
async fn oppenheimer_scenario_resolves_via_credits() {
    let catalog = CannedCatalog::default()
        .with_search(
            "Oppenheimer",
            MediaKind::Movie,
            vec![
                movie(11, "Oppenheimer", "1980-10-01"),
                movie(872585, "Oppenheimer", "2023-07-19"),
            ],
        )
        .with_details(11, MediaKind::Movie, details(&["Sam Waterston"], &[], None, Some(1980)))
        .with_details(
            872585,
            MediaKind::Movie,
            details(
                &["Cillian Murphy", "Emily Blunt"],
                &["Christopher Nolan"],
                Some("tt15398776"),
                Some(2023),
            ),
        );
    let resolver = Resolver::new(Some(catalog));

    let person = ReferencePerson {
        name: "Cillian Murphy".to_string(),
        role: PersonRole::Cast,
    };
    let resolution = resolver
        .resolve(ResolveRequest {
            title: "Oppenheimer",
            year_hint: Some("2023"),
            content_hint: MediaKind::Movie,
            reference_person: Some(&person),
        })
        .await;

    let identity = resolution.identity().expect("should resolve");
    assert_eq!(identity.catalog_id, 872585);
    assert_eq!(identity.media_kind, MediaKind::Movie);
    assert_eq!(identity.external_id.as_deref(), Some("tt15398776"));
    assert_eq!(identity.year, Some(2023));
}

/// Credits evidence must beat the weaker year and title heuristics even
/// when the matching candidate sits lower in the relevance order.
#[tokio::test]
async fn credits_take_precedence_over_year_and_title() {
    let catalog = CannedCatalog::default()
        .with_search(
            "Gladiator",
            MediaKind::Movie,
            vec![
                // The year hint (2000) and the exact title both point here.
                movie(98, "Gladiator", "2000-05-01"),
                movie(99, "Gladiator II", "2024-11-13"),
            ],
        )
        .with_details(98, MediaKind::Movie, details(&["Russell Crowe"], &[], None, None))
        .with_details(
            99,
            MediaKind::Movie,
            details(&["Paul Mescal"], &[], Some("tt9218128"), None),
        );
    let resolver = Resolver::new(Some(catalog));

    let person = ReferencePerson {
        name: "Paul Mescal".to_string(),
        role: PersonRole::Cast,
    };
    let resolution = resolver
        .resolve(ResolveRequest {
            title: "Gladiator",
            year_hint: Some("2000"),
            content_hint: MediaKind::Movie,
            reference_person: Some(&person),
        })
        .await;

    assert_eq!(resolution.identity().map(|i| i.catalog_id), Some(99));
}

/// Without credits or year evidence, the normalized exact-title rule picks
/// "Matrix" for the query "The Matrix" and rejects "Matrix Reloaded".
#[tokio::test]
async fn exact_title_match_after_normalization() {
    let catalog = CannedCatalog::default()
        .with_search(
            "The Matrix",
            MediaKind::Movie,
            vec![
                movie(604, "Matrix Reloaded", "2003-05-15"),
                movie(603, "Matrix", "1999-03-30"),
            ],
        )
        .with_details(603, MediaKind::Movie, details(&[], &[], Some("tt0133093"), None));
    let resolver = Resolver::new(Some(catalog));

    let resolution = resolver
        .resolve(ResolveRequest {
            title: "The Matrix",
            year_hint: None,
            content_hint: MediaKind::Movie,
            reference_person: None,
        })
        .await;

    let identity = resolution.identity().expect("should resolve");
    assert_eq!(identity.catalog_id, 603);
    assert_eq!(identity.external_id.as_deref(), Some("tt0133093"));
}

/// Resolving the same immutable inputs twice yields the same identity.
#[tokio::test]
async fn cascade_is_deterministic() {
    let catalog = CannedCatalog::default().with_search(
        "Dune",
        MediaKind::Movie,
        vec![
            movie(438631, "Dune", "2021-09-15"),
            movie(841, "Dune", "1984-12-14"),
        ],
    );
    let resolver = Resolver::new(Some(catalog));

    let request = ResolveRequest {
        title: "Dune",
        year_hint: Some("Sep 15, 2021"),
        content_hint: MediaKind::Movie,
        reference_person: None,
    };
    let first = resolver.resolve(request).await;
    let second = resolver.resolve(request).await;

    assert!(first.is_resolved());
    assert_eq!(first, second);
}

/// Listings resolved with no catalog configured stay unresolved, without
/// any search traffic.
#[tokio::test]
async fn disabled_catalog_yields_unresolved() {
    let resolver: Resolver<CannedCatalog> = Resolver::new(None);
    let resolution = resolver
        .resolve(ResolveRequest {
            title: "Oppenheimer",
            year_hint: Some("2023"),
            content_hint: MediaKind::Movie,
            reference_person: None,
        })
        .await;
    assert_eq!(resolution, Resolution::Unresolved);
}
