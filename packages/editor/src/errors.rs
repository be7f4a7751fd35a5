//! Error types for the editor

use crate::authority::AuthorityError;
use crate::mutations::MutationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("No timeline is open")]
    NoDocument,

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Authority error: {0}")]
    Authority(#[from] AuthorityError),

    /// Rollback and explicit sync need a reachable authority and a
    /// remote-backed document
    #[error("Sync with the authority is unavailable")]
    SyncUnavailable,

    #[error("Local edits have not been synced yet")]
    PendingLocalEdits,

    #[error("'{0}' is reserved for synchronization and cannot be used as an edit")]
    ReservedOperation(String),
}
