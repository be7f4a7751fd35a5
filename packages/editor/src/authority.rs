//! # Remote Authority
//!
//! The seam between a client and the store that owns a timeline's history.
//! The same request and response types travel over HTTP and through the
//! in-process implementation, so every transport shares one contract.
//!
//! Versions start at 1. A client that has never been confirmed by the
//! authority has no version at all, expressed as `None` on the wire.

use crate::mutations::{Mutation, MutationError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use splice_timeline::Timeline;
use thiserror::Error;

/// Immutable record of one committed document state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: String,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u64>,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_approved: bool,
}

/// Successful write: the new checkpoint and the document it records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Committed {
    pub checkpoint: Checkpoint,
    pub document: Timeline,
}

/// A document as read from the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub document: Timeline,
    pub version: u64,
    pub checkpoint_id: String,
}

impl From<Committed> for Snapshot {
    fn from(committed: Committed) -> Self {
        Self {
            document: committed.document,
            version: committed.checkpoint.version,
            checkpoint_id: committed.checkpoint.checkpoint_id,
        }
    }
}

/// Body of `POST /timelines/:id/:operation`: operation parameters plus the
/// optimistic-concurrency token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    #[serde(flatten)]
    pub mutation: Mutation,
    pub expected_version: u64,
}

/// Body of `POST /timelines/:id/replace-timeline`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceRequest {
    pub document: Timeline,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Body of `POST /timelines/:id/rollback`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub target_version: u64,
    pub expected_version: u64,
}

/// Failures reported by an authority
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error", content = "detail", rename_all = "snake_case")]
pub enum AuthorityError {
    /// The request's token is not the head version; refetch and retry
    #[error("version conflict: expected {expected:?}, head is {actual}")]
    VersionConflict { expected: Option<u64>, actual: u64 },

    #[error("rejected: {0}")]
    Rejected(MutationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed request: {0}")]
    Malformed(String),

    /// Network or server failure; the request may or may not have landed
    #[error("transport error: {0}")]
    Transport(String),
}

impl AuthorityError {
    /// Transient failures are retried on the next reconnect instead of
    /// being reported
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthorityError::Transport(_))
    }
}

/// Authoritative store of timeline histories
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Latest snapshot, or the one at `version`
    async fn fetch(
        &self,
        timeline_id: &str,
        version: Option<u64>,
    ) -> Result<Snapshot, AuthorityError>;

    /// Run `mutation` against the head, provided it is still `expected_version`
    async fn apply(
        &self,
        timeline_id: &str,
        mutation: &Mutation,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError>;

    /// Overwrite the head with `document` unconditionally, creating the
    /// timeline if needed
    async fn replace(
        &self,
        timeline_id: &str,
        document: Timeline,
        expected_version: Option<u64>,
    ) -> Result<Committed, AuthorityError>;

    /// Commit a copy of `target_version` as the new head
    async fn rollback(
        &self,
        timeline_id: &str,
        target_version: u64,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<(), AuthorityError>;
}
