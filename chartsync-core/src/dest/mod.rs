//! Destination list service: payload building and the Trakt client.

mod payload;
mod trakt;

pub use payload::{
    build_mixed_payload, build_single_kind_payload, DestinationSearch, EntryIds, ListEntry,
    ListPayload, TraktKind,
};
pub use trakt::{ListDefinition, TraktClient, UserList, UserListIds};

#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("credential contains characters unusable in a header")]
    InvalidCredential,
}
