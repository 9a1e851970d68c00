//! Refresh scheduler
//!
//! One spawned task per subscription drives fetch cycles over the current
//! watchlist. A cycle always runs to completion; the timer is only armed
//! after the cycle has been published, so at most one cycle is in flight
//! per subscription.

mod subscription;
mod types;

pub use subscription::{Detached, Subscription};
pub use types::{ConfigurationFault, RefreshSnapshot, RefreshState, SchedulerStatus};

use crate::fetch::{BatchFetcher, FetchOutcome};
use crate::symbol::Symbol;
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Default refresh cadence
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Snapshots buffered per subscriber before new ones are dropped
const SNAPSHOT_BUFFER: usize = 16;
const FAULT_BUFFER: usize = 16;

/// Starts refresh subscriptions over a shared batch fetcher
pub struct RefreshScheduler {
    fetcher: Arc<BatchFetcher>,
    interval: Duration,
    faults: broadcast::Sender<ConfigurationFault>,
}

impl RefreshScheduler {
    /// Create a scheduler with the default interval
    pub fn new(fetcher: Arc<BatchFetcher>) -> Self {
        Self::with_interval(fetcher, DEFAULT_REFRESH_INTERVAL)
    }

    pub fn with_interval(fetcher: Arc<BatchFetcher>, interval: Duration) -> Self {
        let (faults, _) = broadcast::channel(FAULT_BUFFER);
        Self {
            fetcher,
            interval,
            faults,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Receive fatal configuration faults from every subscription
    pub fn faults(&self) -> broadcast::Receiver<ConfigurationFault> {
        self.faults.subscribe()
    }

    /// Start refreshing `watchlist`.
    ///
    /// A non-empty watchlist triggers an immediate cycle. Must be called
    /// from within a tokio runtime.
    pub fn subscribe(&self, watchlist: watch::Receiver<Vec<Symbol>>) -> Subscription {
        let id = Uuid::new_v4();
        let (updates_tx, updates_rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let (state, _) = watch::channel(RefreshState::default());
        let state = Arc::new(state);
        let cancel = CancellationToken::new();

        let task = RefreshTask {
            id,
            fetcher: Arc::clone(&self.fetcher),
            interval: self.interval,
            watchlist,
            watchlist_open: true,
            state: Arc::clone(&state),
            updates: updates_tx,
            faults: self.faults.clone(),
            cancel: cancel.clone(),
        };

        let handle = tokio::spawn(task.run());

        tracing::info!(subscription_id = %id, interval_secs = self.interval.as_secs(), "Refresh subscription started");

        Subscription::new(id, updates_rx, state, cancel, handle)
    }
}

enum Wake {
    Cancelled,
    Tick,
    WatchlistChanged,
    WatchlistClosed,
}

struct RefreshTask {
    id: Uuid,
    fetcher: Arc<BatchFetcher>,
    interval: Duration,
    watchlist: watch::Receiver<Vec<Symbol>>,
    watchlist_open: bool,
    state: Arc<watch::Sender<RefreshState>>,
    updates: mpsc::Sender<RefreshSnapshot>,
    faults: broadcast::Sender<ConfigurationFault>,
    cancel: CancellationToken,
}

impl RefreshTask {
    async fn run(mut self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            // Taken once per cycle; later edits are seen by the next cycle
            let symbols = self.watchlist.borrow_and_update().clone();

            if symbols.is_empty() {
                let status = if self.state.borrow().cycle_count == 0 {
                    SchedulerStatus::Idle
                } else {
                    SchedulerStatus::Suspended
                };
                self.set_status(status);
                if !self.wait_for_symbols().await {
                    break;
                }
                continue;
            }

            self.set_status(SchedulerStatus::Running);

            let started = Instant::now();
            let outcome = self.fetcher.fetch_all(&symbols).await;
            if !self.publish(outcome) {
                break;
            }
            record_latency(LatencyMetric::RefreshCycle, started.elapsed());

            if !self.wait_for_next_cycle().await {
                break;
            }
        }

        self.state.send_if_modified(|state| {
            if state.status == SchedulerStatus::Stopped {
                return false;
            }
            state.status = SchedulerStatus::Stopped;
            true
        });
        tracing::info!(subscription_id = %self.id, "Refresh subscription stopped");
    }

    fn set_status(&self, status: SchedulerStatus) {
        let changed = self.state.send_if_modified(|state| {
            if self.cancel.is_cancelled() || state.status == status {
                return false;
            }
            state.status = status;
            true
        });
        if changed {
            tracing::debug!(subscription_id = %self.id, status = %status, "Refresh status changed");
        }
    }

    /// Commit the cycle to state and hand it to the subscriber.
    ///
    /// Returns false when the subscription has been torn down, in which
    /// case the result is discarded.
    fn publish(&self, outcome: FetchOutcome) -> bool {
        let mut published = None;
        self.state.send_if_modified(|state| {
            // Checked under the state lock that teardown also takes
            if self.cancel.is_cancelled() {
                return false;
            }
            let snapshot = RefreshSnapshot::from_outcome(state.cycle_count + 1, outcome);
            state.apply(&snapshot);
            published = Some(snapshot);
            true
        });

        let Some(snapshot) = published else {
            tracing::debug!(subscription_id = %self.id, "Subscription detached mid-cycle, result discarded");
            return false;
        };

        set_gauge(
            GaugeMetric::CycleFailures,
            &self.id.to_string(),
            snapshot.failures.len() as f64,
        );

        if snapshot.is_total_failure() {
            tracing::warn!(
                subscription_id = %self.id,
                cycle = snapshot.cycle,
                failed = snapshot.failures.len(),
                "Every symbol failed this cycle"
            );
        } else {
            tracing::info!(
                subscription_id = %self.id,
                cycle = snapshot.cycle,
                quotes = snapshot.quotes.len(),
                failed = snapshot.failures.len(),
                "Refresh cycle published"
            );
        }

        let unauthorized = snapshot.unauthorized();
        if !unauthorized.is_empty() {
            tracing::error!(
                subscription_id = %self.id,
                symbols = ?unauthorized,
                "Quote provider rejected credentials"
            );
            // No receivers is fine; the fault is also in the snapshot
            let _ = self.faults.send(ConfigurationFault {
                subscription_id: self.id,
                symbols: unauthorized,
                detected_at: Utc::now(),
            });
        }

        match self.updates.try_send(snapshot) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(snapshot)) => {
                tracing::warn!(
                    subscription_id = %self.id,
                    cycle = snapshot.cycle,
                    "Subscriber is lagging, snapshot dropped"
                );
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Wait out the interval; a watchlist edit cuts the wait short
    async fn wait_for_next_cycle(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.interval);
        tokio::pin!(sleep);

        loop {
            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                changed = self.watchlist.changed(), if self.watchlist_open => match changed {
                    Ok(()) => Wake::WatchlistChanged,
                    Err(_) => Wake::WatchlistClosed,
                },
                _ = &mut sleep => Wake::Tick,
            };

            match wake {
                Wake::Cancelled => return false,
                Wake::Tick | Wake::WatchlistChanged => return true,
                Wake::WatchlistClosed => self.watchlist_open = false,
            }
        }
    }

    /// Wait until the watchlist is edited
    async fn wait_for_symbols(&mut self) -> bool {
        loop {
            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                changed = self.watchlist.changed(), if self.watchlist_open => match changed {
                    Ok(()) => Wake::WatchlistChanged,
                    Err(_) => Wake::WatchlistClosed,
                },
            };

            match wake {
                Wake::Cancelled => return false,
                Wake::Tick | Wake::WatchlistChanged => return true,
                Wake::WatchlistClosed => self.watchlist_open = false,
            }
        }
    }
}
