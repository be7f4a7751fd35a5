//! # Reconciler
//!
//! Routes each edit either to the remote authority or to the local engine,
//! and pushes local work back when connectivity returns.
//!
//! ## Routing
//!
//! An edit goes to the authority when the client is connected, the document
//! is remote-backed, and no local edits are waiting. Pending edits on a
//! remote-backed document are synced first; if that sync fails the edit
//! stays local. An offline-origin document keeps editing locally until the
//! next offline-to-online transition pushes it. Everything else runs through
//! [`VersionedStore::apply_local`].
//!
//! ## Serialization
//!
//! Every operation takes `&mut self`, so a single owner can never have two
//! requests in flight carrying the same version token. Shared owners go
//! through [`SharedReconciler`], whose async mutex queues callers in
//! arrival order.

use crate::authority::RemoteAuthority;
use crate::errors::EditorError;
use crate::mutations::Mutation;
use crate::store::{StoreState, VersionedStore};
use splice_timeline::Timeline;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// A reconciler shared between tasks; lock it for each operation
pub type SharedReconciler<A> = Arc<Mutex<Reconciler<A>>>;

/// Where an edit landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Remote { version: u64, checkpoint_id: String },
    Local { local_edit_counter: u64 },
}

/// Result of observing a connectivity change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not an offline-to-online transition
    Unchanged,
    NothingPending,
    Synced { version: u64 },
    /// The sync attempt failed; it is retried on the next reconnect
    Deferred,
}

pub struct Reconciler<A: RemoteAuthority + ?Sized> {
    timeline_id: String,
    store: VersionedStore,
    authority: Arc<A>,
    connectivity: watch::Receiver<bool>,
    was_connected: bool,
}

impl<A: RemoteAuthority + ?Sized> Reconciler<A> {
    pub fn new(
        timeline_id: impl Into<String>,
        authority: Arc<A>,
        connectivity: watch::Receiver<bool>,
    ) -> Self {
        let was_connected = *connectivity.borrow();
        Self {
            timeline_id: timeline_id.into(),
            store: VersionedStore::new(),
            authority,
            connectivity,
            was_connected,
        }
    }

    pub fn into_shared(self) -> SharedReconciler<A> {
        Arc::new(Mutex::new(self))
    }

    pub fn timeline_id(&self) -> &str {
        &self.timeline_id
    }

    pub fn store(&self) -> &VersionedStore {
        &self.store
    }

    pub fn document(&self) -> Option<&Timeline> {
        self.store.document()
    }

    pub fn is_connected(&self) -> bool {
        *self.connectivity.borrow()
    }

    /// Load the authority's latest snapshot
    pub async fn open(&mut self) -> Result<(), EditorError> {
        let snapshot = self.authority.fetch(&self.timeline_id, None).await?;
        tracing::info!(
            timeline = %self.timeline_id,
            version = snapshot.version,
            "opened remote timeline"
        );
        self.store.open_remote(snapshot);
        Ok(())
    }

    /// Start from a document the authority has never seen
    pub fn open_offline(&mut self, document: Timeline) {
        tracing::info!(timeline = %self.timeline_id, "opened offline timeline");
        self.store.open_offline(document);
    }

    pub fn close(&mut self) {
        if self.store.pending_sync() {
            tracing::warn!(
                timeline = %self.timeline_id,
                local_edits = self.store.local_edit_counter(),
                "closing with unsynced local edits"
            );
        }
        self.store.close();
    }

    /// Apply one interactive edit
    pub async fn edit(&mut self, mutation: Mutation) -> Result<EditOutcome, EditorError> {
        if let Mutation::ReplaceTimeline { .. } = mutation {
            return Err(EditorError::ReservedOperation(mutation.name().to_string()));
        }
        if self.store.state() == StoreState::Unsynced {
            return Err(EditorError::NoDocument);
        }

        // Offline-origin documents are pushed only on a reconnect edge
        let remote_backed = self.store.state() == StoreState::RemoteBacked;
        if remote_backed && self.is_connected() && self.store.pending_sync() {
            if let Err(e) = self.sync().await {
                tracing::warn!(timeline = %self.timeline_id, error = %e, "sync before edit failed");
            }
        }

        match self.remote_route() {
            Some(expected_version) => {
                let committed = self
                    .authority
                    .apply(&self.timeline_id, &mutation, expected_version)
                    .await?;
                let outcome = EditOutcome::Remote {
                    version: committed.checkpoint.version,
                    checkpoint_id: committed.checkpoint.checkpoint_id.clone(),
                };
                tracing::debug!(op = mutation.name(), ?outcome, "edit committed remotely");
                self.store.accept_remote(committed);
                Ok(outcome)
            }
            None => {
                let local_edit_counter = self.store.apply_local(&mutation)?;
                tracing::debug!(op = mutation.name(), local_edit_counter, "edit applied locally");
                Ok(EditOutcome::Local { local_edit_counter })
            }
        }
    }

    /// Version token to send with a routed edit, or `None` to stay local
    fn remote_route(&self) -> Option<u64> {
        if !self.is_connected() || self.store.pending_sync() {
            return None;
        }
        match self.store.state() {
            StoreState::RemoteBacked => self.store.remote_version(),
            StoreState::OfflineOrigin | StoreState::Unsynced => None,
        }
    }

    /// React to the connectivity flag; syncs on an offline-to-online edge
    pub async fn on_connectivity_changed(&mut self, connected: bool) -> SyncOutcome {
        let was_connected = std::mem::replace(&mut self.was_connected, connected);
        if !connected || was_connected {
            return SyncOutcome::Unchanged;
        }

        tracing::info!(timeline = %self.timeline_id, "connectivity restored");
        if !self.store.pending_sync() {
            return SyncOutcome::NothingPending;
        }

        match self.sync().await {
            Ok(version) => SyncOutcome::Synced { version },
            Err(e) => {
                tracing::warn!(timeline = %self.timeline_id, error = %e, "sync deferred");
                SyncOutcome::Deferred
            }
        }
    }

    /// Push the whole local document as the new head.
    ///
    /// Last writer wins: anything committed on the authority since
    /// `remote_version` is overwritten.
    pub async fn sync(&mut self) -> Result<u64, EditorError> {
        if !self.is_connected() {
            return Err(EditorError::SyncUnavailable);
        }
        let document = self.store.document().cloned().ok_or(EditorError::NoDocument)?;
        let local_edits = self.store.local_edit_counter();

        let committed = self
            .authority
            .replace(&self.timeline_id, document, self.store.remote_version())
            .await?;
        let version = committed.checkpoint.version;
        self.store.mark_synced(committed);

        tracing::info!(timeline = %self.timeline_id, version, local_edits, "synced local edits");
        Ok(version)
    }

    /// Restore `target_version` as a new head. Only the authority keeps
    /// history, so this never falls back to a local approximation.
    pub async fn rollback(&mut self, target_version: u64) -> Result<u64, EditorError> {
        if !self.is_connected() || self.store.state() != StoreState::RemoteBacked {
            return Err(EditorError::SyncUnavailable);
        }
        if self.store.pending_sync() {
            return Err(EditorError::PendingLocalEdits);
        }
        let expected_version = self.store.remote_version().ok_or(EditorError::SyncUnavailable)?;

        let committed = self
            .authority
            .rollback(&self.timeline_id, target_version, expected_version)
            .await?;
        let version = committed.checkpoint.version;
        self.store.accept_remote(committed);

        tracing::info!(timeline = %self.timeline_id, target_version, version, "rolled back");
        Ok(version)
    }

    /// Refetch the authority's head, typically after a version conflict
    pub async fn refresh(&mut self) -> Result<u64, EditorError> {
        if self.store.pending_sync() {
            return Err(EditorError::PendingLocalEdits);
        }
        let snapshot = self.authority.fetch(&self.timeline_id, None).await?;
        let version = snapshot.version;
        self.store.open_remote(snapshot);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::AuthorityError;
    use crate::mutations::MutationError;
    use crate::testing::FakeAuthority;
    use splice_timeline::{TimeRange, TrackKind};

    fn add_video() -> Mutation {
        Mutation::AddTrack {
            name: None,
            kind: TrackKind::Video,
            index: None,
        }
    }

    fn add_clip(frames: f64) -> Mutation {
        Mutation::AddClip {
            track_index: 0,
            asset_id: "asset".into(),
            source_range: TimeRange::from_frames(0.0, frames, 24.0),
            name: None,
            index: None,
        }
    }

    async fn opened(
        connected: bool,
    ) -> (Arc<FakeAuthority>, watch::Sender<bool>, Reconciler<FakeAuthority>) {
        let authority = Arc::new(FakeAuthority::with_document(Timeline::new("t", 24.0)));
        let (tx, rx) = watch::channel(true);
        let mut reconciler = Reconciler::new("t", authority.clone(), rx);
        reconciler.open().await.unwrap();
        tx.send_replace(connected);
        reconciler.on_connectivity_changed(connected).await;
        (authority, tx, reconciler)
    }

    #[tokio::test]
    async fn test_connected_edit_goes_remote() {
        let (authority, _tx, mut reconciler) = opened(true).await;

        let outcome = reconciler.edit(add_video()).await.unwrap();
        assert_eq!(
            outcome,
            EditOutcome::Remote {
                version: 2,
                checkpoint_id: "cp-2".into()
            }
        );
        assert_eq!(reconciler.store().remote_version(), Some(2));
        assert!(!reconciler.store().pending_sync());
        assert_eq!(authority.head().unwrap().0, *reconciler.document().unwrap());
    }

    #[tokio::test]
    async fn test_offline_edits_stay_local_then_sync_once() {
        let (authority, tx, mut reconciler) = opened(false).await;

        reconciler.edit(add_video()).await.unwrap();
        let outcome = reconciler.edit(add_clip(120.0)).await.unwrap();
        assert_eq!(outcome, EditOutcome::Local { local_edit_counter: 2 });
        assert!(!authority.calls().contains(&"apply"));

        tx.send_replace(true);
        let outcome = reconciler.on_connectivity_changed(true).await;
        assert_eq!(outcome, SyncOutcome::Synced { version: 2 });

        let replaces = authority.calls().iter().filter(|c| **c == "replace").count();
        assert_eq!(replaces, 1);
        assert!(!reconciler.store().pending_sync());
        assert_eq!(reconciler.store().local_edit_counter(), 0);
        assert_eq!(authority.head().unwrap().0, *reconciler.document().unwrap());
    }

    #[tokio::test]
    async fn test_reconnect_without_pending_edits_does_nothing() {
        let (authority, tx, mut reconciler) = opened(false).await;
        tx.send_replace(true);
        assert_eq!(reconciler.on_connectivity_changed(true).await, SyncOutcome::NothingPending);
        assert_eq!(reconciler.on_connectivity_changed(true).await, SyncOutcome::Unchanged);
        assert!(!authority.calls().contains(&"replace"));
    }

    #[tokio::test]
    async fn test_failed_sync_is_deferred_and_keeps_pending() {
        let (authority, tx, mut reconciler) = opened(false).await;
        reconciler.edit(add_video()).await.unwrap();

        authority.set_reachable(false);
        tx.send_replace(true);
        assert_eq!(reconciler.on_connectivity_changed(true).await, SyncOutcome::Deferred);
        assert!(reconciler.store().pending_sync());
        assert_eq!(reconciler.store().remote_version(), Some(1));

        // the next edit retries the sync, then routes remotely
        authority.set_reachable(true);
        let outcome = reconciler.edit(add_clip(24.0)).await.unwrap();
        assert!(matches!(outcome, EditOutcome::Remote { version: 3, .. }));
    }

    #[tokio::test]
    async fn test_edit_stays_local_when_sync_before_edit_fails() {
        let (authority, tx, mut reconciler) = opened(false).await;
        reconciler.edit(add_video()).await.unwrap();

        authority.set_reachable(false);
        tx.send_replace(true);
        assert!(reconciler.is_connected());

        let outcome = reconciler.edit(add_clip(24.0)).await.unwrap();
        assert_eq!(outcome, EditOutcome::Local { local_edit_counter: 2 });
        assert!(reconciler.store().pending_sync());
        assert_eq!(reconciler.store().remote_version(), Some(1));
        assert_eq!(reconciler.store().state(), StoreState::RemoteBacked);

        let calls = authority.calls();
        assert!(calls.contains(&"replace"));
        assert!(!calls.contains(&"apply"));
        assert_eq!(authority.head().unwrap().1, 1);
    }

    #[tokio::test]
    async fn test_refresh_refused_while_edits_pending() {
        let (authority, tx, mut reconciler) = opened(false).await;
        reconciler.edit(add_video()).await.unwrap();
        let before = reconciler.document().cloned();
        let calls_before = authority.calls().len();

        assert_eq!(reconciler.refresh().await.unwrap_err(), EditorError::PendingLocalEdits);

        tx.send_replace(true);
        authority.set_reachable(false);
        assert_eq!(reconciler.refresh().await.unwrap_err(), EditorError::PendingLocalEdits);
        assert_eq!(reconciler.document().cloned(), before);
        assert_eq!(reconciler.store().local_edit_counter(), 1);
        assert_eq!(authority.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_rollback_refused_while_edits_pending() {
        let (authority, tx, mut reconciler) = opened(false).await;
        reconciler.edit(add_video()).await.unwrap();

        // connected, but the reconnect sync has not happened yet
        tx.send_replace(true);
        assert_eq!(reconciler.rollback(1).await.unwrap_err(), EditorError::PendingLocalEdits);
        assert!(!authority.calls().contains(&"rollback"));
        assert_eq!(reconciler.store().local_edit_counter(), 1);
        assert_eq!(authority.head().unwrap().1, 1);
    }

    #[tokio::test]
    async fn test_version_conflict_leaves_store_untouched() {
        let (authority, _tx, mut reconciler) = opened(true).await;
        authority.commit_elsewhere(Timeline::new("theirs", 24.0));

        let before = reconciler.document().cloned();
        let err = reconciler.edit(add_video()).await.unwrap_err();
        assert_eq!(
            err,
            EditorError::Authority(AuthorityError::VersionConflict {
                expected: Some(1),
                actual: 2
            })
        );
        assert_eq!(reconciler.document().cloned(), before);
        assert_eq!(reconciler.store().remote_version(), Some(1));

        assert_eq!(reconciler.refresh().await.unwrap(), 2);
        assert_eq!(reconciler.document().unwrap().name, "theirs");
    }

    #[tokio::test]
    async fn test_remote_validation_failure_is_reported() {
        let (_authority, _tx, mut reconciler) = opened(true).await;
        let err = reconciler.edit(Mutation::RemoveTrack { track_index: 3 }).await.unwrap_err();
        assert!(matches!(
            err,
            EditorError::Authority(AuthorityError::Rejected(MutationError::IndexOutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_fall_back_to_local() {
        let (authority, _tx, mut reconciler) = opened(true).await;
        authority.set_reachable(false);

        let err = reconciler.edit(add_video()).await.unwrap_err();
        assert!(matches!(err, EditorError::Authority(AuthorityError::Transport(_))));
        assert!(!reconciler.store().pending_sync());
    }

    #[tokio::test]
    async fn test_offline_origin_edits_locally_even_when_connected() {
        let authority = Arc::new(FakeAuthority::empty());
        let (tx, rx) = watch::channel(true);
        let mut reconciler = Reconciler::new("draft", authority.clone(), rx);
        reconciler.open_offline(Timeline::new("draft", 24.0));

        let outcome = reconciler.edit(add_video()).await.unwrap();
        assert_eq!(outcome, EditOutcome::Local { local_edit_counter: 1 });
        let outcome = reconciler.edit(add_clip(48.0)).await.unwrap();
        assert_eq!(outcome, EditOutcome::Local { local_edit_counter: 2 });
        assert_eq!(reconciler.store().state(), StoreState::OfflineOrigin);
        assert!(authority.calls().is_empty());

        tx.send_replace(false);
        assert_eq!(reconciler.on_connectivity_changed(false).await, SyncOutcome::Unchanged);
        tx.send_replace(true);
        assert_eq!(
            reconciler.on_connectivity_changed(true).await,
            SyncOutcome::Synced { version: 1 }
        );
        assert_eq!(reconciler.store().state(), StoreState::RemoteBacked);
        assert_eq!(authority.head().unwrap().1, 1);
    }

    #[tokio::test]
    async fn test_rollback_requires_connectivity() {
        let (_authority, _tx, mut reconciler) = opened(false).await;
        assert_eq!(reconciler.rollback(1).await.unwrap_err(), EditorError::SyncUnavailable);

        let authority = Arc::new(FakeAuthority::empty());
        let (_tx, rx) = watch::channel(true);
        let mut offline_origin = Reconciler::new("draft", authority, rx);
        offline_origin.open_offline(Timeline::new("draft", 24.0));
        assert_eq!(offline_origin.rollback(1).await.unwrap_err(), EditorError::SyncUnavailable);
    }

    #[tokio::test]
    async fn test_rollback_commits_a_new_head() {
        let (_authority, _tx, mut reconciler) = opened(true).await;
        reconciler.edit(add_video()).await.unwrap();
        reconciler.edit(add_video()).await.unwrap();

        let version = reconciler.rollback(1).await.unwrap();
        assert_eq!(version, 4);
        assert!(reconciler.document().unwrap().tracks.children.is_empty());
    }

    #[tokio::test]
    async fn test_replace_timeline_is_not_an_edit() {
        let (_authority, _tx, mut reconciler) = opened(true).await;
        let err = reconciler
            .edit(Mutation::ReplaceTimeline {
                document: Box::new(Timeline::new("x", 24.0)),
            })
            .await
            .unwrap_err();
        assert_eq!(err, EditorError::ReservedOperation("replace-timeline".into()));
    }

    #[tokio::test]
    async fn test_edit_without_document() {
        let authority = Arc::new(FakeAuthority::empty());
        let (_tx, rx) = watch::channel(true);
        let mut reconciler = Reconciler::new("t", authority, rx);
        assert_eq!(reconciler.edit(add_video()).await.unwrap_err(), EditorError::NoDocument);
    }

    #[tokio::test]
    async fn test_shared_reconciler_serializes_callers() {
        let (authority, _tx, reconciler) = opened(true).await;
        let shared = reconciler.into_shared();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move { shared.lock().await.edit(add_video()).await }));
        }
        for handle in handles {
            assert!(matches!(handle.await.unwrap().unwrap(), EditOutcome::Remote { .. }));
        }

        assert_eq!(authority.head().unwrap().1, 6);
        assert_eq!(shared.lock().await.document().unwrap().tracks.children.len(), 5);
    }
}
