//! Refresh state and published snapshots

use crate::fetch::FetchOutcome;
use crate::quote::{Quote, QuoteError};
use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Lifecycle of one subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Subscribed, but no cycle has run because the watchlist is empty
    #[default]
    Idle,
    /// Cycling on the refresh interval
    Running,
    /// Watchlist became empty; no timer, no network calls
    Suspended,
    /// Subscriber detached; terminal
    Stopped,
}

impl std::fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchedulerStatus::Idle => "idle",
            SchedulerStatus::Running => "running",
            SchedulerStatus::Suspended => "suspended",
            SchedulerStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Result of one completed fetch cycle, as delivered to the subscriber
#[derive(Debug, Clone)]
pub struct RefreshSnapshot {
    /// 1-based cycle number within the subscription
    pub cycle: u64,
    /// Successful quotes, in watchlist order
    pub quotes: Vec<Quote>,
    /// Failed symbols with their reasons
    pub failures: Vec<(Symbol, QuoteError)>,
    pub cycle_timestamp: DateTime<Utc>,
}

impl RefreshSnapshot {
    pub(crate) fn from_outcome(cycle: u64, outcome: FetchOutcome) -> Self {
        let (quotes, failures) = outcome.into_parts();
        Self {
            cycle,
            quotes,
            failures,
            cycle_timestamp: Utc::now(),
        }
    }

    pub fn quote(&self, symbol: &Symbol) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.symbol == *symbol)
    }

    pub fn failure(&self, symbol: &Symbol) -> Option<&QuoteError> {
        self.failures
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, e)| e)
    }

    /// Every symbol in the cycle, successes first
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.quotes
            .iter()
            .map(|q| &q.symbol)
            .chain(self.failures.iter().map(|(s, _)| s))
    }

    pub fn is_total_failure(&self) -> bool {
        self.quotes.is_empty() && !self.failures.is_empty()
    }

    /// Symbols that failed with `Unauthorized`
    pub fn unauthorized(&self) -> Vec<Symbol> {
        self.failures
            .iter()
            .filter(|(_, e)| e.is_fatal())
            .map(|(s, _)| s.clone())
            .collect()
    }
}

/// Process-local state of one subscription
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    pub status: SchedulerStatus,
    /// Cycles published so far
    pub cycle_count: u64,
    pub last_quotes: Vec<Quote>,
    pub last_failures: Vec<(Symbol, QuoteError)>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl RefreshState {
    pub(crate) fn apply(&mut self, snapshot: &RefreshSnapshot) {
        self.cycle_count = snapshot.cycle;
        self.last_quotes = snapshot.quotes.clone();
        self.last_failures = snapshot.failures.clone();
        self.last_cycle_at = Some(snapshot.cycle_timestamp);
    }

    pub fn is_stopped(&self) -> bool {
        self.status == SchedulerStatus::Stopped
    }

    /// Last known quote for `symbol`
    pub fn quote(&self, symbol: &Symbol) -> Option<&Quote> {
        self.last_quotes.iter().find(|q| q.symbol == *symbol)
    }
}

/// Fatal configuration signal raised when the provider rejects credentials
#[derive(Debug, Clone)]
pub struct ConfigurationFault {
    pub subscription_id: Uuid,
    pub symbols: Vec<Symbol>,
    pub detected_at: DateTime<Utc>,
}
