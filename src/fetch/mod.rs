//! Batch quote fetching
//!
//! Fans a watchlist out to the quote client, one task per symbol, and
//! waits for every task before returning. A failing symbol is recorded in
//! the outcome and never aborts its siblings.

mod outcome;

pub use outcome::FetchOutcome;

use crate::quote::{Quote, QuoteClient, QuoteError};
use crate::symbol::Symbol;
use crate::telemetry::{record_latency, record_quote_result, LatencyMetric};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Configuration for the batch fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum in-flight provider requests
    pub max_concurrency: usize,
    /// Extra attempts for `Transient` failures (0 = no retry)
    pub max_retries: u32,
    /// Delay between retry attempts
    pub retry_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Concurrent, collect-all quote fetcher
pub struct BatchFetcher {
    client: Arc<dyn QuoteClient>,
    config: FetchConfig,
    permits: Arc<Semaphore>,
}

impl BatchFetcher {
    /// Create a fetcher with default configuration
    pub fn new(client: Arc<dyn QuoteClient>) -> Self {
        Self::with_config(client, FetchConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(client: Arc<dyn QuoteClient>, config: FetchConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            client,
            config,
            permits,
        }
    }

    /// Get the fetcher configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch quotes for every symbol concurrently.
    ///
    /// Duplicate symbols are fetched once. An empty input returns an empty
    /// outcome without touching the network.
    pub async fn fetch_all(&self, symbols: &[Symbol]) -> FetchOutcome {
        let mut unique: Vec<Symbol> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !unique.contains(symbol) {
                unique.push(symbol.clone());
            }
        }

        let mut outcome = FetchOutcome::new();
        if unique.is_empty() {
            return outcome;
        }

        let started = Instant::now();

        let handles: Vec<_> = unique
            .iter()
            .map(|symbol| {
                let client = Arc::clone(&self.client);
                let permits = Arc::clone(&self.permits);
                let config = self.config.clone();
                let symbol = symbol.clone();
                tokio::spawn(async move { fetch_one(client, permits, config, symbol).await })
            })
            .collect();

        let results = join_all(handles).await;

        for (symbol, joined) in unique.into_iter().zip(results) {
            let result = joined.unwrap_or_else(|e| {
                tracing::error!(symbol = %symbol, error = %e, "Quote task aborted");
                Err(QuoteError::Transient(format!("quote task failed: {}", e)))
            });
            record_quote_result(match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            });
            outcome.record(symbol, result);
        }

        record_latency(LatencyMetric::BatchFetch, started.elapsed());

        tracing::debug!(
            requested = outcome.len(),
            succeeded = outcome.success_count(),
            failed = outcome.failure_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch fetch complete"
        );

        outcome
    }
}

/// Fetch one symbol under the concurrency limit, retrying transient failures
async fn fetch_one(
    client: Arc<dyn QuoteClient>,
    permits: Arc<Semaphore>,
    config: FetchConfig,
    symbol: Symbol,
) -> Result<Quote, QuoteError> {
    let mut attempt = 0;

    loop {
        let result = {
            let _permit = permits
                .acquire()
                .await
                .map_err(|_| QuoteError::Transient("fetcher shut down".to_string()))?;
            client.fetch_quote(&symbol).await
        };

        match result {
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                tracing::debug!(symbol = %symbol, attempt, error = %e, "Retrying quote");
                tokio::time::sleep(config.retry_backoff).await;
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Quote fetch failed");
                return Err(e);
            }
            Ok(quote) => return Ok(quote),
        }
    }
}
