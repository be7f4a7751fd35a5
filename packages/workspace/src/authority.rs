use crate::state::WorkspaceState;
use async_trait::async_trait;
use splice_editor::timeline::Timeline;
use splice_editor::{AuthorityError, Committed, Mutation, RemoteAuthority, Snapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process authority over a shared [`WorkspaceState`].
///
/// Several `LocalAuthority` values may wrap the same state with different
/// actors, standing in for several clients of one server.
#[derive(Clone)]
pub struct LocalAuthority {
    state: Arc<RwLock<WorkspaceState>>,
    actor: String,
    reachable: Arc<AtomicBool>,
}

impl LocalAuthority {
    pub fn new(state: Arc<RwLock<WorkspaceState>>, actor: impl Into<String>) -> Self {
        Self {
            state,
            actor: actor.into(),
            reachable: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate losing (or regaining) the connection to the authority
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn state(&self) -> Arc<RwLock<WorkspaceState>> {
        self.state.clone()
    }

    fn connect(&self) -> Result<(), AuthorityError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthorityError::Transport("authority unreachable".into()))
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, WorkspaceState>, AuthorityError> {
        self.connect()?;
        self.state
            .read()
            .map_err(|_| AuthorityError::Transport("workspace state poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, WorkspaceState>, AuthorityError> {
        self.connect()?;
        self.state
            .write()
            .map_err(|_| AuthorityError::Transport("workspace state poisoned".into()))
    }
}

#[async_trait]
impl RemoteAuthority for LocalAuthority {
    async fn fetch(
        &self,
        timeline_id: &str,
        version: Option<u64>,
    ) -> Result<Snapshot, AuthorityError> {
        Ok(self.read()?.get(timeline_id, version)?)
    }

    async fn apply(
        &self,
        timeline_id: &str,
        mutation: &Mutation,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError> {
        Ok(self.write()?.apply(timeline_id, mutation, expected_version, &self.actor)?)
    }

    async fn replace(
        &self,
        timeline_id: &str,
        document: Timeline,
        expected_version: Option<u64>,
    ) -> Result<Committed, AuthorityError> {
        Ok(self
            .write()?
            .replace(timeline_id, document, expected_version, &self.actor)?)
    }

    async fn rollback(
        &self,
        timeline_id: &str,
        target_version: u64,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError> {
        Ok(self
            .write()?
            .rollback(timeline_id, target_version, expected_version, &self.actor)?)
    }

    async fn ping(&self) -> Result<(), AuthorityError> {
        self.connect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_authority_reports_transport() {
        let authority = LocalAuthority::new(Arc::new(RwLock::new(WorkspaceState::new())), "alice");
        authority
            .replace("reel", Timeline::new("reel", 24.0), None)
            .await
            .unwrap();

        authority.set_reachable(false);
        assert!(matches!(authority.ping().await, Err(AuthorityError::Transport(_))));
        assert!(matches!(
            authority.fetch("reel", None).await,
            Err(AuthorityError::Transport(_))
        ));

        authority.set_reachable(true);
        assert_eq!(authority.fetch("reel", None).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_actor_is_recorded() {
        let state = Arc::new(RwLock::new(WorkspaceState::new()));
        let alice = LocalAuthority::new(state.clone(), "alice");
        let bob = LocalAuthority::new(state, "bob");

        alice.replace("reel", Timeline::new("reel", 24.0), None).await.unwrap();
        let committed = bob
            .apply("reel", &Mutation::RenameTrack { track_index: 0, name: "x".into() }, 1)
            .await;
        assert!(matches!(committed, Err(AuthorityError::Rejected(_))));

        let committed = bob.rollback("reel", 1, 1).await.unwrap();
        assert_eq!(committed.checkpoint.created_by, "bob");
    }
}
