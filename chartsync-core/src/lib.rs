//! # chartsync-core
//!
//! Core library for chartsync: ingests daily ranked top-10 charts from a
//! streaming-chart site, resolves each entry to a canonical TMDB identity,
//! and republishes the resolved entries into managed Trakt lists.
//!
//! ## Overview
//!
//! The heart of the crate is the entity-resolution cascade in [`resolve`]:
//! a multi-step matcher that takes the ambiguous (title, year, credited
//! person) tuple scraped for one listing and deterministically resolves it
//! to a unique catalog identifier. Around it sit the machinery that makes
//! repeated resolution calls safe and efficient:
//!
//! - [`limiter`]: rolling-window rate limiting for catalog calls
//! - [`retry`]: bounded exponential-backoff retry for destination writes
//! - [`cache`]: per-run page memoization for the source feed
//!
//! The remaining modules are the collaborators the cascade sits between:
//! [`feed`] (FlixPatrol chart scraping), [`providers`] (the TMDB catalog
//! client), [`dest`] (Trakt payloads and list management), and [`sync`]
//! (the run orchestration and summary).
//!
//! ## Execution model
//!
//! Single-threaded and sequential: one listing is fully resolved before the
//! next begins. Every catalog call passes through the rate limiter before
//! dispatch; every destination write goes through the retry policy. Run
//! state (page cache, limiter log, failed-section set) is constructed at
//! run start, threaded explicitly, and dropped at run end.

pub mod cache;
pub mod dest;
pub mod error;
pub mod feed;
pub mod limiter;
pub mod providers;
pub mod resolve;
pub mod retry;
pub mod sync;
pub mod types;

pub use error::{Result, SyncError};
pub use types::{
    CatalogCandidate, DetailSignals, MediaKind, PersonRole, RawListing, ReferencePerson,
    ResolvedIdentity, ResolvedListing, Resolution,
};
