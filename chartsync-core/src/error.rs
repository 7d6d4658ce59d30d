use thiserror::Error;

use crate::dest::DestinationError;

/// Run-fatal errors.
///
/// Per-item and per-section failures are swallowed at the call site and
/// reported through the end-of-run summary; only destination credential
/// problems abort a run, and they do so before any write.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("destination rejected the access token (status {0})")]
    TokenRejected(u16),

    #[error("destination token check failed: {0}")]
    TokenCheck(#[source] DestinationError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
