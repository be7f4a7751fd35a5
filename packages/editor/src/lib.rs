//! # Splice Editor
//!
//! Mutation engine and client-side sync for Splice timelines.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ timeline: document model + rational time    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor                                      │
//! │  - Mutation: pure copy-on-write edits       │
//! │  - VersionedStore: local copy + bookkeeping │
//! │  - Reconciler: remote vs local routing      │
//! │  - Session: reconnect + sync lifecycle      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ RemoteAuthority: versioned history          │
//! │  (in-process or over HTTP, see workspace)   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are values**: every edit returns a new `Timeline`
//! 2. **One engine, two hosts**: the authority runs the same `Mutation::apply`
//! 3. **Server authority**: a connected client always defers to the head
//! 4. **Last writer wins**: reconnect sync replaces the whole document
//!
//! ## Usage
//!
//! ```rust,ignore
//! use splice_editor::{Mutation, Session, SessionConfig};
//! use splice_timeline::TrackKind;
//!
//! let session = Session::open("reel-1", authority, SessionConfig::default()).await?;
//!
//! session
//!     .edit(Mutation::AddTrack { name: None, kind: TrackKind::Video, index: None })
//!     .await?;
//!
//! session.close().await;
//! ```

mod authority;
mod errors;
mod mutations;
mod ops;
mod reconciler;
mod session;
mod store;

#[cfg(test)]
mod testing;

pub use authority::{
    AuthorityError, Checkpoint, Committed, MutationRequest, RemoteAuthority, ReplaceRequest,
    RollbackRequest, Snapshot,
};
pub use errors::EditorError;
pub use mutations::{Collection, Mutation, MutationError};
pub use reconciler::{EditOutcome, Reconciler, SharedReconciler, SyncOutcome};
pub use session::{Connectivity, ReconnectTask, Session, SessionConfig};
pub use store::{StoreState, VersionedStore};

// Re-export the document model for convenience
pub use splice_timeline as timeline;
