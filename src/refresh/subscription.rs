//! Subscriber handle for a running refresh task

use super::{RefreshSnapshot, RefreshState, SchedulerStatus};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Handle to one refresh subscription.
///
/// Dropping the handle detaches it: the timer is cancelled and a cycle
/// still in flight is discarded when it completes.
///
/// At most `SNAPSHOT_BUFFER` unread snapshots are queued; newer ones are
/// dropped while the queue is full. [`Subscription::state`] always holds
/// the latest cycle, so a reader that falls behind should resync from it.
pub struct Subscription {
    id: Uuid,
    updates: mpsc::Receiver<RefreshSnapshot>,
    state: Arc<watch::Sender<RefreshState>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(
        id: Uuid,
        updates: mpsc::Receiver<RefreshSnapshot>,
        state: Arc<watch::Sender<RefreshState>>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            updates,
            state,
            cancel,
            task: Some(task),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next queued snapshot; `None` once the task has ended.
    ///
    /// Queued snapshots can be older than [`Subscription::state`] if this
    /// reader lagged and cycles were dropped.
    pub async fn next_snapshot(&mut self) -> Option<RefreshSnapshot> {
        self.updates.recv().await
    }

    /// Take a published snapshot if one is waiting
    pub fn try_next_snapshot(&mut self) -> Option<RefreshSnapshot> {
        self.updates.try_recv().ok()
    }

    /// Copy of the current refresh state
    pub fn state(&self) -> RefreshState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> SchedulerStatus {
        self.state.borrow().status
    }

    /// Receiver notified on every state change
    pub fn watch_state(&self) -> watch::Receiver<RefreshState> {
        self.state.subscribe()
    }

    /// Detach from the scheduler and keep a handle to await the task's exit
    pub fn detach(mut self) -> Detached {
        self.teardown();
        Detached {
            state: self.state.subscribe(),
            task: self.task.take(),
        }
    }

    /// Cancel under the state lock so the task cannot publish past this point
    fn teardown(&self) {
        self.state.send_if_modified(|state| {
            self.cancel.cancel();
            if state.status == SchedulerStatus::Stopped {
                return false;
            }
            state.status = SchedulerStatus::Stopped;
            true
        });
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(subscription_id = %self.id, "Refresh subscription detached");
        }
        self.teardown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

/// A detached subscription whose task may still be finishing a cycle
#[derive(Debug)]
pub struct Detached {
    state: watch::Receiver<RefreshState>,
    task: Option<JoinHandle<()>>,
}

impl Detached {
    pub fn state(&self) -> RefreshState {
        self.state.borrow().clone()
    }

    /// Wait for the task to exit and return its final state
    pub async fn join(mut self) -> RefreshState {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Refresh task ended abnormally");
            }
        }
        self.state.borrow().clone()
    }
}
