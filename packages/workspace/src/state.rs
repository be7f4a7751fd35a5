//! Authority-side timeline histories.
//!
//! Each timeline is an append-only list of checkpoints. Versions start at 1
//! and grow by one per commit; nothing is ever rewritten, so rollback is a
//! new commit holding an older document.

use chrono::Utc;
use splice_editor::timeline::{TimeError, Timeline};
use splice_editor::{AuthorityError, Checkpoint, Committed, Mutation, MutationError, Snapshot};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("Timeline not found: {0}")]
    TimelineNotFound(String),

    #[error("Timeline {id} has no version {version}")]
    VersionNotFound { id: String, version: u64 },

    #[error("Timeline already exists: {0}")]
    AlreadyExists(String),

    #[error("Version conflict: expected {expected}, head is {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Mutation rejected: {0}")]
    Rejected(#[from] MutationError),

    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] TimeError),
}

impl From<StateError> for AuthorityError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::TimelineNotFound(id) => AuthorityError::NotFound(id),
            StateError::VersionNotFound { id, version } => {
                AuthorityError::NotFound(format!("{}@{}", id, version))
            }
            StateError::AlreadyExists(id) => {
                AuthorityError::Malformed(format!("timeline {} already exists", id))
            }
            StateError::VersionConflict { expected, actual } => AuthorityError::VersionConflict {
                expected: Some(expected),
                actual,
            },
            StateError::Rejected(e) => AuthorityError::Rejected(e),
            StateError::InvalidDocument(e) => {
                AuthorityError::Malformed(format!("invalid document: {}", e))
            }
        }
    }
}

/// One committed checkpoint and the document it records
#[derive(Debug, Clone)]
struct HistoryEntry {
    checkpoint: Checkpoint,
    document: Timeline,
}

/// Ordered checkpoints of a single timeline
#[derive(Debug, Clone, Default)]
pub struct TimelineHistory {
    entries: Vec<HistoryEntry>,
}

impl TimelineHistory {
    pub fn head_version(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn checkpoints(&self) -> impl Iterator<Item = &Checkpoint> {
        self.entries.iter().map(|e| &e.checkpoint)
    }

    fn entry(&self, version: u64) -> Option<&HistoryEntry> {
        (version as usize).checked_sub(1).and_then(|i| self.entries.get(i))
    }

    fn head(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    fn commit(&mut self, document: Timeline, description: String, created_by: &str) -> Committed {
        let parent_version = self.head().map(|e| e.checkpoint.version);
        let checkpoint = Checkpoint {
            checkpoint_id: uuid::Uuid::new_v4().to_string(),
            version: self.head_version() + 1,
            parent_version,
            description,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
            is_approved: false,
        };

        self.entries.push(HistoryEntry {
            checkpoint: checkpoint.clone(),
            document: document.clone(),
        });
        Committed { checkpoint, document }
    }

    fn check_expected(&self, expected: u64) -> Result<(), StateError> {
        let actual = self.head_version();
        if expected == actual {
            Ok(())
        } else {
            Err(StateError::VersionConflict { expected, actual })
        }
    }
}

/// Every timeline the authority knows about
#[derive(Debug, Default)]
pub struct WorkspaceState {
    timelines: BTreeMap<String, TimelineHistory>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeline_ids(&self) -> impl Iterator<Item = &str> {
        self.timelines.keys().map(String::as_str)
    }

    pub fn history(&self, id: &str) -> Result<&TimelineHistory, StateError> {
        self.timelines
            .get(id)
            .ok_or_else(|| StateError::TimelineNotFound(id.to_string()))
    }

    fn history_mut(&mut self, id: &str) -> Result<&mut TimelineHistory, StateError> {
        self.timelines
            .get_mut(id)
            .ok_or_else(|| StateError::TimelineNotFound(id.to_string()))
    }

    /// Start a new timeline at version 1
    pub fn create(
        &mut self,
        id: &str,
        document: Timeline,
        created_by: &str,
    ) -> Result<Committed, StateError> {
        if self.timelines.contains_key(id) {
            return Err(StateError::AlreadyExists(id.to_string()));
        }
        document.validate()?;
        let committed = self
            .timelines
            .entry(id.to_string())
            .or_default()
            .commit(document, "Create timeline".to_string(), created_by);

        tracing::info!(timeline = %id, "created timeline");
        Ok(committed)
    }

    /// The head snapshot, or the one at `version`
    pub fn get(&self, id: &str, version: Option<u64>) -> Result<Snapshot, StateError> {
        let history = self.history(id)?;
        let entry = match version {
            Some(version) => history.entry(version).ok_or_else(|| StateError::VersionNotFound {
                id: id.to_string(),
                version,
            })?,
            None => history
                .head()
                .ok_or_else(|| StateError::TimelineNotFound(id.to_string()))?,
        };

        Ok(Snapshot {
            document: entry.document.clone(),
            version: entry.checkpoint.version,
            checkpoint_id: entry.checkpoint.checkpoint_id.clone(),
        })
    }

    /// Run `mutation` against the head if `expected_version` is current.
    /// A rejected mutation leaves the history unchanged.
    pub fn apply(
        &mut self,
        id: &str,
        mutation: &Mutation,
        expected_version: u64,
        actor: &str,
    ) -> Result<Committed, StateError> {
        let history = self.history_mut(id)?;
        history.check_expected(expected_version)?;

        let head = history
            .head()
            .ok_or_else(|| StateError::TimelineNotFound(id.to_string()))?;
        let next = mutation.apply(&head.document)?;
        let committed = history.commit(next, mutation.describe(), actor);

        tracing::info!(
            timeline = %id,
            op = mutation.name(),
            version = committed.checkpoint.version,
            "committed mutation"
        );
        Ok(committed)
    }

    /// Overwrite the head with `document`, creating the timeline if needed.
    ///
    /// Accepted regardless of `expected_version`: this is the
    /// last-writer-wins path used by reconnect sync.
    pub fn replace(
        &mut self,
        id: &str,
        document: Timeline,
        expected_version: Option<u64>,
        actor: &str,
    ) -> Result<Committed, StateError> {
        document.validate()?;

        let history = self.timelines.entry(id.to_string()).or_default();
        let head = history.head_version();
        if expected_version.is_some_and(|expected| expected != head) {
            tracing::warn!(
                timeline = %id,
                expected = ?expected_version,
                head,
                "replace overwrites commits the writer never saw"
            );
        }

        let committed = history.commit(document, "Replace timeline".to_string(), actor);
        tracing::info!(timeline = %id, version = committed.checkpoint.version, "replaced timeline");
        Ok(committed)
    }

    /// Commit a copy of `target_version` as the new head
    pub fn rollback(
        &mut self,
        id: &str,
        target_version: u64,
        expected_version: u64,
        actor: &str,
    ) -> Result<Committed, StateError> {
        let history = self.history_mut(id)?;
        history.check_expected(expected_version)?;

        let target = history
            .entry(target_version)
            .ok_or_else(|| StateError::VersionNotFound {
                id: id.to_string(),
                version: target_version,
            })?
            .document
            .clone();
        let description = format!("Rollback to version {}", target_version);
        let committed = history.commit(target, description, actor);

        tracing::info!(
            timeline = %id,
            target_version,
            version = committed.checkpoint.version,
            "rolled back timeline"
        );
        Ok(committed)
    }

    /// Mark a checkpoint as approved
    pub fn approve(&mut self, id: &str, version: u64) -> Result<Checkpoint, StateError> {
        let history = self.history_mut(id)?;
        let index = (version as usize).checked_sub(1);
        let entry = index
            .and_then(|i| history.entries.get_mut(i))
            .ok_or_else(|| StateError::VersionNotFound {
                id: id.to_string(),
                version,
            })?;
        entry.checkpoint.is_approved = true;
        Ok(entry.checkpoint.clone())
    }
}
