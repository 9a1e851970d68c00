//! In-memory quote client
//!
//! Backs the mock backend and tests. Unknown symbols report `NotFound`,
//! like the live provider does for delisted tickers.

use super::{Quote, QuoteClient, QuoteError};
use crate::symbol::Symbol;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum MockEntry {
    Quote {
        display_name: String,
        price: f64,
        absolute_change: f64,
        percent_change: f64,
    },
    Failure(QuoteError),
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<Symbol, MockEntry>,
    /// Remaining transient failures to inject before the entry is served
    flaky: HashMap<Symbol, u32>,
    calls: HashMap<Symbol, usize>,
}

/// Deterministic quote client with programmable responses
#[derive(Debug, Default)]
pub struct MockQuoteClient {
    state: RwLock<MockState>,
    latency: Option<Duration>,
    total_calls: AtomicUsize,
}

impl MockQuoteClient {
    /// Create an empty client; every symbol reports `NotFound`
    pub fn new() -> Self {
        Self::default()
    }

    /// Client seeded with a handful of well-known tickers
    pub fn demo() -> Self {
        [
            ("AAPL", "Apple Inc", 189.84, 1.42, 0.7536),
            ("GOOGL", "Alphabet Inc", 141.8, -0.62, -0.4353),
            ("MSFT", "Microsoft Corp", 374.51, 2.93, 0.7886),
            ("AMZN", "Amazon.com Inc", 147.03, -1.1, -0.7426),
            ("TSLA", "Tesla Inc", 238.45, 4.86, 2.0806),
            ("NVDA", "NVIDIA Corp", 481.11, 6.02, 1.2671),
            ("META", "Meta Platforms Inc", 334.92, -2.15, -0.6379),
        ]
        .into_iter()
        .fold(Self::new(), |client, (ticker, name, price, change, pct)| {
            match ticker.parse::<Symbol>() {
                Ok(symbol) => client.with_quote(symbol, name, price, change, pct),
                Err(_) => client,
            }
        })
    }

    /// Serve a fixed quote for `symbol`
    pub fn with_quote(
        mut self,
        symbol: Symbol,
        display_name: impl Into<String>,
        price: f64,
        absolute_change: f64,
        percent_change: f64,
    ) -> Self {
        self.state.get_mut().entries.insert(
            symbol,
            MockEntry::Quote {
                display_name: display_name.into(),
                price,
                absolute_change,
                percent_change,
            },
        );
        self
    }

    /// Always fail `symbol` with `error`
    pub fn with_failure(mut self, symbol: Symbol, error: QuoteError) -> Self {
        self.state
            .get_mut()
            .entries
            .insert(symbol, MockEntry::Failure(error));
        self
    }

    /// Fail `symbol` with `Transient` for the next `times` calls
    pub fn with_transient_failures(mut self, symbol: Symbol, times: u32) -> Self {
        self.state.get_mut().flaky.insert(symbol, times);
        self
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replace the response for `symbol` at runtime
    pub async fn set_quote(&self, symbol: Symbol, display_name: impl Into<String>, price: f64) {
        self.state.write().await.entries.insert(
            symbol,
            MockEntry::Quote {
                display_name: display_name.into(),
                price,
                absolute_change: 0.0,
                percent_change: 0.0,
            },
        );
    }

    /// Make `symbol` fail with `error` at runtime
    pub async fn set_failure(&self, symbol: Symbol, error: QuoteError) {
        self.state
            .write()
            .await
            .entries
            .insert(symbol, MockEntry::Failure(error));
    }

    /// Total number of `fetch_quote` calls
    pub fn calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_quote` calls for one symbol
    pub async fn calls_for(&self, symbol: &Symbol) -> usize {
        self.state
            .read()
            .await
            .calls
            .get(symbol)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl QuoteClient for MockQuoteClient {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let entry = {
            let mut state = self.state.write().await;
            *state.calls.entry(symbol.clone()).or_insert(0) += 1;

            let flaky = match state.flaky.get_mut(symbol) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };

            if flaky {
                Some(MockEntry::Failure(QuoteError::Transient(
                    "injected transient failure".to_string(),
                )))
            } else {
                state.entries.get(symbol).cloned()
            }
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match entry {
            Some(MockEntry::Quote {
                display_name,
                price,
                absolute_change,
                percent_change,
            }) => Ok(Quote {
                symbol: symbol.clone(),
                display_name,
                price,
                absolute_change,
                percent_change,
                observed_at: Utc::now(),
            }),
            Some(MockEntry::Failure(error)) => Err(error),
            None => Err(QuoteError::NotFound(symbol.clone())),
        }
    }
}
