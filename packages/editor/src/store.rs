//! # Versioned Store
//!
//! Client-side copy of one open timeline plus its sync bookkeeping.
//!
//! ```text
//! Unsynced ──open_remote──> RemoteBacked ──┐
//!    │                                      ├─ apply_local: pending_sync = true
//!    └────open_offline────> OfflineOrigin ──┘
//!                               │ mark_synced
//!                               └──────────> RemoteBacked
//! ```
//!
//! The store never talks to the network; the reconciler decides what to
//! call and when.

use crate::authority::{Committed, Snapshot};
use crate::errors::EditorError;
use crate::mutations::Mutation;
use splice_timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// No document loaded
    Unsynced,
    /// Mirrors the authority at `remote_version`, possibly with pending edits
    RemoteBacked,
    /// Created locally and never confirmed by the authority
    OfflineOrigin,
}

#[derive(Debug, Clone, Default)]
pub struct VersionedStore {
    document: Option<Timeline>,
    remote_version: Option<u64>,
    checkpoint_id: Option<String>,
    local_edit_counter: u64,
    pending_sync: bool,
    is_offline_origin: bool,
}

impl VersionedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document confirmed by the authority, discarding any prior state
    pub fn open_remote(&mut self, snapshot: Snapshot) {
        *self = Self {
            document: Some(snapshot.document),
            remote_version: Some(snapshot.version),
            checkpoint_id: Some(snapshot.checkpoint_id),
            ..Self::default()
        };
    }

    /// Start from a locally created document.
    ///
    /// The document counts as pending so the first successful sync creates
    /// it on the authority.
    pub fn open_offline(&mut self, document: Timeline) {
        *self = Self {
            document: Some(document),
            pending_sync: true,
            is_offline_origin: true,
            ..Self::default()
        };
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> StoreState {
        match (&self.document, self.is_offline_origin) {
            (None, _) => StoreState::Unsynced,
            (Some(_), true) => StoreState::OfflineOrigin,
            (Some(_), false) => StoreState::RemoteBacked,
        }
    }

    /// Run `mutation` through the local engine.
    ///
    /// Returns the new local edit count. On failure nothing changes.
    pub fn apply_local(&mut self, mutation: &Mutation) -> Result<u64, EditorError> {
        let document = self.document.as_ref().ok_or(EditorError::NoDocument)?;
        let next = mutation.apply(document)?;

        self.document = Some(next);
        self.local_edit_counter += 1;
        self.pending_sync = true;
        Ok(self.local_edit_counter)
    }

    /// Adopt the authority's response to a routed edit or rollback
    pub fn accept_remote(&mut self, committed: Committed) {
        self.remote_version = Some(committed.checkpoint.version);
        self.checkpoint_id = Some(committed.checkpoint.checkpoint_id);
        self.document = Some(committed.document);
    }

    /// Adopt the response to a full replace: everything local is now on the
    /// authority
    pub fn mark_synced(&mut self, committed: Committed) {
        self.accept_remote(committed);
        self.local_edit_counter = 0;
        self.pending_sync = false;
        self.is_offline_origin = false;
    }

    pub fn document(&self) -> Option<&Timeline> {
        self.document.as_ref()
    }

    pub fn remote_version(&self) -> Option<u64> {
        self.remote_version
    }

    pub fn checkpoint_id(&self) -> Option<&str> {
        self.checkpoint_id.as_deref()
    }

    pub fn local_edit_counter(&self) -> u64 {
        self.local_edit_counter
    }

    pub fn pending_sync(&self) -> bool {
        self.pending_sync
    }

    pub fn is_offline_origin(&self) -> bool {
        self.is_offline_origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::Checkpoint;
    use crate::mutations::MutationError;
    use chrono::Utc;
    use splice_timeline::TrackKind;

    fn committed(document: Timeline, version: u64) -> Committed {
        Committed {
            checkpoint: Checkpoint {
                checkpoint_id: format!("cp-{}", version),
                version,
                parent_version: version.checked_sub(1),
                description: "test".into(),
                created_by: "tester".into(),
                created_at: Utc::now(),
                is_approved: false,
            },
            document,
        }
    }

    fn add_video() -> Mutation {
        Mutation::AddTrack {
            name: None,
            kind: TrackKind::Video,
            index: None,
        }
    }

    #[test]
    fn test_lifecycle_states() {
        let mut store = VersionedStore::new();
        assert_eq!(store.state(), StoreState::Unsynced);

        store.open_offline(Timeline::new("draft", 24.0));
        assert_eq!(store.state(), StoreState::OfflineOrigin);
        assert!(store.pending_sync());
        assert_eq!(store.remote_version(), None);

        store.mark_synced(committed(Timeline::new("draft", 24.0), 1));
        assert_eq!(store.state(), StoreState::RemoteBacked);
        assert!(!store.pending_sync());
        assert_eq!(store.checkpoint_id(), Some("cp-1"));

        store.close();
        assert_eq!(store.state(), StoreState::Unsynced);
        assert_eq!(store.remote_version(), None);
    }

    #[test]
    fn test_apply_local_counts_edits() {
        let mut store = VersionedStore::new();
        store.open_remote(Snapshot {
            document: Timeline::new("t", 24.0),
            version: 4,
            checkpoint_id: "cp-4".into(),
        });
        assert!(!store.pending_sync());

        assert_eq!(store.apply_local(&add_video()).unwrap(), 1);
        assert_eq!(store.apply_local(&add_video()).unwrap(), 2);
        assert!(store.pending_sync());
        assert_eq!(store.remote_version(), Some(4));
        assert_eq!(store.document().unwrap().tracks.children.len(), 2);
    }

    #[test]
    fn test_failed_local_edit_leaves_store_untouched() {
        let mut store = VersionedStore::new();
        store.open_remote(Snapshot {
            document: Timeline::new("t", 24.0),
            version: 1,
            checkpoint_id: "cp-1".into(),
        });

        let err = store.apply_local(&Mutation::RemoveTrack { track_index: 0 }).unwrap_err();
        assert!(matches!(
            err,
            EditorError::Mutation(MutationError::IndexOutOfRange { .. })
        ));
        assert_eq!(store.local_edit_counter(), 0);
        assert!(!store.pending_sync());
    }

    #[test]
    fn test_apply_local_without_document() {
        let mut store = VersionedStore::new();
        assert_eq!(store.apply_local(&add_video()).unwrap_err(), EditorError::NoDocument);
    }

    #[test]
    fn test_accept_remote_keeps_pending_flags() {
        let mut store = VersionedStore::new();
        store.open_offline(Timeline::new("t", 24.0));
        store.apply_local(&add_video()).unwrap();

        store.accept_remote(committed(Timeline::new("t", 24.0), 9));
        assert_eq!(store.remote_version(), Some(9));
        assert!(store.pending_sync());
        assert_eq!(store.local_edit_counter(), 1);
    }
}
