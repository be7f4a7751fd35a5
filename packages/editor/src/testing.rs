//! In-memory authority for unit tests

use crate::authority::{AuthorityError, Checkpoint, Committed, RemoteAuthority, Snapshot};
use crate::mutations::Mutation;
use async_trait::async_trait;
use chrono::Utc;
use splice_timeline::Timeline;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub(crate) struct FakeAuthority {
    history: Mutex<Vec<Timeline>>,
    reachable: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeAuthority {
    pub fn empty() -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_document(document: Timeline) -> Self {
        let authority = Self::empty();
        authority.history.lock().unwrap().push(document);
        authority
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn head(&self) -> Option<(Timeline, u64)> {
        let history = self.history.lock().unwrap();
        history.last().map(|doc| (doc.clone(), history.len() as u64))
    }

    /// Simulate another client committing directly
    pub fn commit_elsewhere(&self, document: Timeline) {
        self.history.lock().unwrap().push(document);
    }

    fn enter(&self, call: &'static str) -> Result<(), AuthorityError> {
        self.calls.lock().unwrap().push(call);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthorityError::Transport("connection refused".into()))
        }
    }

    fn commit(history: &mut Vec<Timeline>, document: Timeline, description: &str) -> Committed {
        let parent_version = (!history.is_empty()).then_some(history.len() as u64);
        history.push(document.clone());
        let version = history.len() as u64;
        Committed {
            checkpoint: Checkpoint {
                checkpoint_id: format!("cp-{}", version),
                version,
                parent_version,
                description: description.to_string(),
                created_by: "fake".into(),
                created_at: Utc::now(),
                is_approved: false,
            },
            document,
        }
    }

    fn check_head(history: &[Timeline], expected: u64) -> Result<(), AuthorityError> {
        let actual = history.len() as u64;
        if expected == actual {
            Ok(())
        } else {
            Err(AuthorityError::VersionConflict {
                expected: Some(expected),
                actual,
            })
        }
    }
}

#[async_trait]
impl RemoteAuthority for FakeAuthority {
    async fn fetch(
        &self,
        timeline_id: &str,
        version: Option<u64>,
    ) -> Result<Snapshot, AuthorityError> {
        self.enter("fetch")?;
        let history = self.history.lock().unwrap();
        let version = version.unwrap_or(history.len() as u64);
        let index = (version as usize).checked_sub(1);
        match index.and_then(|i| history.get(i)) {
            Some(document) => Ok(Snapshot {
                document: document.clone(),
                version,
                checkpoint_id: format!("cp-{}", version),
            }),
            None => Err(AuthorityError::NotFound(timeline_id.to_string())),
        }
    }

    async fn apply(
        &self,
        _timeline_id: &str,
        mutation: &Mutation,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError> {
        self.enter("apply")?;
        let mut history = self.history.lock().unwrap();
        Self::check_head(&history, expected_version)?;
        let head = history.last().cloned().unwrap_or_else(|| Timeline::new("", 24.0));
        let next = mutation.apply(&head).map_err(AuthorityError::Rejected)?;
        Ok(Self::commit(&mut history, next, &mutation.describe()))
    }

    async fn replace(
        &self,
        _timeline_id: &str,
        document: Timeline,
        _expected_version: Option<u64>,
    ) -> Result<Committed, AuthorityError> {
        self.enter("replace")?;
        let mut history = self.history.lock().unwrap();
        Ok(Self::commit(&mut history, document, "Replace timeline"))
    }

    async fn rollback(
        &self,
        timeline_id: &str,
        target_version: u64,
        expected_version: u64,
    ) -> Result<Committed, AuthorityError> {
        self.enter("rollback")?;
        let mut history = self.history.lock().unwrap();
        Self::check_head(&history, expected_version)?;
        let target = (target_version as usize)
            .checked_sub(1)
            .and_then(|i| history.get(i).cloned())
            .ok_or_else(|| {
                AuthorityError::NotFound(format!("{}@{}", timeline_id, target_version))
            })?;
        Ok(Self::commit(&mut history, target, "Rollback"))
    }

    async fn ping(&self) -> Result<(), AuthorityError> {
        self.enter("ping")
    }
}
