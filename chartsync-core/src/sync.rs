//! Daily sync run: scrape every configured chart section, resolve the
//! listings, and republish them into the destination lists.
//!
//! One thread of control, sequential awaits: a listing is fully resolved
//! before the next begins, and the binding constraint is the catalog rate
//! limit, not local compute. Per-section and per-item failures are recorded
//! and reported in the end-of-run summary; only a rejected destination
//! credential aborts the run, and it does so before any write.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, warn};

use crate::dest::{
    build_mixed_payload, build_single_kind_payload, DestinationError, ListDefinition, TraktClient,
    TraktKind,
};
use crate::error::{Result, SyncError};
use crate::feed::{ChartFeed, SectionOutcome};
use crate::providers::CatalogProvider;
use crate::resolve::{ResolveRequest, Resolver};
use crate::retry::RetryPolicy;
use crate::types::{MediaKind, ResolvedListing};

/// Kind discipline of a destination list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDiscipline {
    Movies,
    Shows,
    Mixed,
}

/// A destination list a chart section is republished into.
#[derive(Debug, Clone)]
pub struct ListSpec {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub discipline: ListDiscipline,
}

/// One (service, section) chart mapped to its destination list.
#[derive(Debug, Clone)]
pub struct ChartTask {
    /// Short identifier used in logs and the run summary,
    /// e.g. "netflix_movies".
    pub key: String,
    pub url: String,
    pub section: String,
    pub list: ListSpec,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Dump every resolved section table before updating lists.
    pub print_lists: bool,
}

/// End-of-run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_sections: usize,
    pub successful_sections: usize,
    /// Names of sections that failed to scrape and lists that failed to
    /// update, sorted.
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total_sections == 0 {
            return 0.0;
        }
        (self.successful_sections as f64 / self.total_sections as f64) * 100.0
    }

    fn log(&self) {
        info!("execution summary:");
        info!("  total sections: {}", self.total_sections);
        info!("  successful: {}", self.successful_sections);
        info!("  failed: {}", self.failed.len());
        if !self.failed.is_empty() {
            warn!("  failed sections: {}", self.failed.join(", "));
        }
        info!("  success rate: {:.1}%", self.success_rate());
    }
}

#[derive(Debug, Default)]
struct SectionReport {
    rows: Vec<ResolvedListing>,
}

/// Walks the chart plan and republishes every section into its list.
#[derive(Debug)]
pub struct SyncRunner<F, P> {
    feed: F,
    resolver: Resolver<P>,
    trakt: TraktClient,
    retry: RetryPolicy,
    tasks: Vec<ChartTask>,
    options: SyncOptions,
}

impl<F: ChartFeed, P: CatalogProvider> SyncRunner<F, P> {
    pub fn new(
        feed: F,
        resolver: Resolver<P>,
        trakt: TraktClient,
        retry: RetryPolicy,
        tasks: Vec<ChartTask>,
        options: SyncOptions,
    ) -> Self {
        Self {
            feed,
            resolver,
            trakt,
            retry,
            tasks,
            options,
        }
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        info!("starting streaming chart sync ({} sections)", self.tasks.len());
        if !self.resolver.is_enabled() {
            warn!("no catalog API key configured; listings will not be resolved");
        }

        let (reports, mut failed) = self.collect_sections().await;

        if self.options.print_lists {
            for (task, report) in self.tasks.iter().zip(&reports) {
                log_section(&task.key, &report.rows);
            }
        }

        // Token validity is checked once, before any write.
        match self.trakt.check_token().await {
            Ok(()) => info!("destination access token OK"),
            Err(DestinationError::Status(code)) => return Err(SyncError::TokenRejected(code)),
            Err(err) => return Err(SyncError::TokenCheck(err)),
        }

        self.ensure_lists(&mut failed).await;
        self.update_lists(&reports, &mut failed).await;

        let summary = RunSummary {
            total_sections: self.tasks.len(),
            successful_sections: reports.iter().filter(|r| !r.rows.is_empty()).count(),
            failed: failed.into_iter().collect(),
        };
        summary.log();
        info!("finished updating lists");
        Ok(summary)
    }

    /// Scrape every configured section and resolve its listings, one at a
    /// time. Returns one report per task, in task order, plus the keys of
    /// sections whose pages could not be fetched.
    async fn collect_sections(&mut self) -> (Vec<SectionReport>, BTreeSet<String>) {
        let mut reports = Vec::with_capacity(self.tasks.len());
        let mut failed = BTreeSet::new();

        for task in &self.tasks {
            match self.feed.fetch_section(&task.url, &task.section).await {
                SectionOutcome::Failed(err) => {
                    warn!("failed to scrape {}: {err}", task.key);
                    failed.insert(task.key.clone());
                    reports.push(SectionReport::default());
                }
                SectionOutcome::Listings(listings) => {
                    let mut rows = Vec::with_capacity(listings.len());
                    for listing in listings {
                        let signals = self.feed.detail_signals(&listing.slug).await;

                        // The detail page's kind signal stands in for a
                        // missing section hint (mixed/overall charts).
                        let content_hint = if listing.content_hint.is_concrete() {
                            listing.content_hint
                        } else {
                            signals.detail_media_kind.unwrap_or(MediaKind::Unknown)
                        };

                        let resolution = self
                            .resolver
                            .resolve(ResolveRequest {
                                title: &listing.title,
                                year_hint: signals.year.as_deref(),
                                content_hint,
                                reference_person: signals.reference_person.as_ref(),
                            })
                            .await;

                        rows.push(ResolvedListing {
                            listing,
                            signals,
                            resolution,
                        });
                    }
                    debug!("scraped {} items from {}", rows.len(), task.key);
                    reports.push(SectionReport { rows });
                }
            }
        }

        (reports, failed)
    }

    /// Create any configured list the destination does not have yet.
    /// Failures here are recorded, not fatal: the affected list simply fails
    /// its update later.
    async fn ensure_lists(&self, failed: &mut BTreeSet<String>) {
        let known: HashSet<String> = match self.trakt.get_lists().await {
            Ok(lists) => lists.into_iter().map(|l| l.ids.slug).collect(),
            Err(err) => {
                warn!("could not enumerate destination lists: {err}");
                return;
            }
        };

        for task in &self.tasks {
            if known.contains(&task.list.slug) {
                continue;
            }
            let definition = ListDefinition {
                name: task.list.name.clone(),
                description: task.list.description.clone(),
                privacy: "public".to_string(),
                display_numbers: true,
            };
            let trakt = &self.trakt;
            let definition_ref = &definition;
            let outcome = self
                .retry
                .run(&format!("create list {}", task.list.slug), move || async move {
                    trakt.create_list(definition_ref).await
                })
                .await;
            if outcome.is_none() {
                failed.insert(task.list.slug.clone());
            }
        }
        debug!("destination lists checked");
    }

    async fn update_lists(&self, reports: &[SectionReport], failed: &mut BTreeSet<String>) {
        for (task, report) in self.tasks.iter().zip(reports) {
            let payload = match task.list.discipline {
                ListDiscipline::Movies => {
                    build_single_kind_payload(&self.trakt, &report.rows, TraktKind::Movie).await
                }
                ListDiscipline::Shows => {
                    build_single_kind_payload(&self.trakt, &report.rows, TraktKind::Show).await
                }
                ListDiscipline::Mixed => build_mixed_payload(&self.trakt, &report.rows).await,
            };

            let trakt = &self.trakt;
            let slug = task.list.slug.as_str();
            let payload_ref = &payload;
            let outcome = self
                .retry
                .run(&format!("update list {slug}"), move || async move {
                    trakt.update_list(slug, payload_ref).await
                })
                .await;
            if outcome.is_none() {
                failed.insert(task.list.slug.clone());
            }
        }
    }
}

fn log_section(key: &str, rows: &[ResolvedListing]) {
    if rows.is_empty() {
        info!("no data to display for {key}");
        return;
    }
    info!("{:=<30}", "");
    info!("{key}");
    info!("{:=<30}", "");
    for row in rows {
        let identity = row.resolution.identity();
        info!(
            "{}: {} | {} | {} | {} | {} | {} | {}",
            row.listing.rank,
            row.listing.title,
            row.listing.slug,
            row.signals.year.as_deref().unwrap_or("unknown"),
            row.signals
                .reference_person
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("unknown"),
            identity
                .map(|i| i.catalog_id.to_string())
                .unwrap_or_else(|| "unresolved".to_string()),
            identity
                .and_then(|i| i.external_id.as_deref())
                .unwrap_or("unresolved"),
            identity
                .map(|i| i.media_kind.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        );
    }
}
