//! # Edit Session Management
//!
//! Ties one open timeline to its background work.
//!
//! A [`Session`] owns the shared reconciler, the connectivity flag, a
//! [`ReconnectTask`] that keeps probing the authority, and a listener that
//! forwards connectivity changes to the reconciler. Opening a session starts
//! both tasks; closing it cancels them and resets the store.

use crate::authority::RemoteAuthority;
use crate::errors::EditorError;
use crate::mutations::Mutation;
use crate::reconciler::{EditOutcome, Reconciler, SharedReconciler};
use splice_timeline::Timeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Shared connectivity flag.
///
/// Readers subscribe to a `watch` channel; only actual changes wake them.
#[derive(Clone)]
pub struct Connectivity {
    sender: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(connected: bool) -> Self {
        let (sender, _) = watch::channel(connected);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish the current state. Returns true if it changed.
    pub fn set(&self, connected: bool) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        })
    }

    pub fn is_connected(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Periodically pings the authority and publishes reachability.
///
/// Runs until [`ReconnectTask::stop`] is called or the task is dropped.
pub struct ReconnectTask {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ReconnectTask {
    pub fn spawn<A>(authority: Arc<A>, connectivity: Connectivity, interval: Duration) -> Self
    where
        A: RemoteAuthority + ?Sized + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let reachable = authority.ping().await.is_ok();
                        if connectivity.set(reachable) {
                            tracing::info!(reachable, "authority reachability changed");
                        }
                    }
                }
            }
            tracing::debug!("reconnect task stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel and wait for the task to exit
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ReconnectTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often the authority is pinged while disconnected
    pub reconnect_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(5),
        }
    }
}

/// One open timeline with its background tasks
pub struct Session<A: RemoteAuthority + ?Sized + 'static> {
    reconciler: SharedReconciler<A>,
    connectivity: Connectivity,
    reconnect: Option<ReconnectTask>,
    listener_cancel: CancellationToken,
    listener: Option<JoinHandle<()>>,
}

impl<A: RemoteAuthority + ?Sized + 'static> Session<A> {
    /// Open a timeline that already exists on the authority
    pub async fn open(
        timeline_id: impl Into<String>,
        authority: Arc<A>,
        config: SessionConfig,
    ) -> Result<Self, EditorError> {
        let connectivity = Connectivity::new(authority.ping().await.is_ok());
        let mut reconciler =
            Reconciler::new(timeline_id, authority.clone(), connectivity.subscribe());
        reconciler.open().await?;
        Ok(Self::start(reconciler, authority, connectivity, config))
    }

    /// Open a locally created timeline; it is pushed on the first sync
    pub async fn open_offline(
        timeline_id: impl Into<String>,
        document: Timeline,
        authority: Arc<A>,
        config: SessionConfig,
    ) -> Result<Self, EditorError> {
        let connectivity = Connectivity::new(false);
        let mut reconciler =
            Reconciler::new(timeline_id, authority.clone(), connectivity.subscribe());
        reconciler.open_offline(document);
        Ok(Self::start(reconciler, authority, connectivity, config))
    }

    fn start(
        reconciler: Reconciler<A>,
        authority: Arc<A>,
        connectivity: Connectivity,
        config: SessionConfig,
    ) -> Self {
        let reconciler = reconciler.into_shared();
        let reconnect =
            ReconnectTask::spawn(authority, connectivity.clone(), config.reconnect_interval);

        let listener_cancel = CancellationToken::new();
        let listener = tokio::spawn(listen(
            reconciler.clone(),
            connectivity.subscribe(),
            listener_cancel.clone(),
        ));

        Self {
            reconciler,
            connectivity,
            reconnect: Some(reconnect),
            listener_cancel,
            listener: Some(listener),
        }
    }

    pub async fn edit(&self, mutation: Mutation) -> Result<EditOutcome, EditorError> {
        self.reconciler.lock().await.edit(mutation).await
    }

    pub async fn sync(&self) -> Result<u64, EditorError> {
        self.reconciler.lock().await.sync().await
    }

    pub async fn rollback(&self, target_version: u64) -> Result<u64, EditorError> {
        self.reconciler.lock().await.rollback(target_version).await
    }

    pub async fn refresh(&self) -> Result<u64, EditorError> {
        self.reconciler.lock().await.refresh().await
    }

    /// Copy of the current document
    pub async fn document(&self) -> Option<Timeline> {
        self.reconciler.lock().await.document().cloned()
    }

    pub fn reconciler(&self) -> SharedReconciler<A> {
        self.reconciler.clone()
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Stop background work and reset the store
    pub async fn close(mut self) {
        if let Some(reconnect) = self.reconnect.take() {
            reconnect.stop().await;
        }
        self.listener_cancel.cancel();
        if let Some(listener) = self.listener.take() {
            let _ = listener.await;
        }
        self.reconciler.lock().await.close();
    }
}

impl<A: RemoteAuthority + ?Sized + 'static> Drop for Session<A> {
    fn drop(&mut self) {
        self.listener_cancel.cancel();
    }
}

async fn listen<A>(
    reconciler: SharedReconciler<A>,
    mut changes: watch::Receiver<bool>,
    cancel: CancellationToken,
) where
    A: RemoteAuthority + ?Sized + 'static,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let connected = *changes.borrow_and_update();
                let outcome = reconciler.lock().await.on_connectivity_changed(connected).await;
                tracing::debug!(connected, ?outcome, "connectivity change handled");
            }
        }
    }
}
