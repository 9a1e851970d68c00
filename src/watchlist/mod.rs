//! Per-user watchlist
//!
//! `WatchlistStore` owns the authoritative symbol set for one signed-in
//! user and is the only writer of the remote `watchlist` field. The local
//! set is loaded once per session and only changes after the remote
//! write has succeeded.

mod types;

pub use types::{Tier, ValidationError, WatchlistError};

use crate::quote::{QuoteClient, QuoteError};
use crate::session::UserId;
use crate::store::{DocumentStore, WATCHLIST_FIELD};
use crate::symbol::{validate, Symbol};
use crate::telemetry::{record_mutation, set_gauge, GaugeMetric};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Authoritative watchlist for one user
pub struct WatchlistStore {
    user_id: UserId,
    tier: Tier,
    documents: Arc<dyn DocumentStore>,
    quotes: Arc<dyn QuoteClient>,
    symbols: watch::Sender<Vec<Symbol>>,
    /// Serializes add/remove so checks and writes see a stable set
    write_lock: Mutex<()>,
}

impl WatchlistStore {
    /// Create an empty store without reading the remote profile
    pub fn new(
        user_id: UserId,
        tier: Tier,
        documents: Arc<dyn DocumentStore>,
        quotes: Arc<dyn QuoteClient>,
    ) -> Self {
        Self::with_symbols(user_id, tier, documents, quotes, Vec::new())
    }

    fn with_symbols(
        user_id: UserId,
        tier: Tier,
        documents: Arc<dyn DocumentStore>,
        quotes: Arc<dyn QuoteClient>,
        symbols: Vec<Symbol>,
    ) -> Self {
        let (tx, _rx) = watch::channel(symbols);
        Self {
            user_id,
            tier,
            documents,
            quotes,
            symbols: tx,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the user's watchlist from the document store.
    ///
    /// Stored entries are normalized; duplicates and entries that no longer
    /// validate are skipped. The profile's tier wins over `default_tier`.
    pub async fn load(
        user_id: UserId,
        documents: Arc<dyn DocumentStore>,
        quotes: Arc<dyn QuoteClient>,
        default_tier: Tier,
    ) -> Result<Self, WatchlistError> {
        let profile = documents
            .get(&user_id)
            .await
            .map_err(|e| WatchlistError::StoreUnavailable(e.to_string()))?;

        let mut symbols: Vec<Symbol> = Vec::with_capacity(profile.watchlist.len());
        for entry in &profile.watchlist {
            let Some(raw) = entry.as_str() else {
                tracing::warn!(user_id = %user_id, entry = %entry, "Skipping non-string stored symbol");
                continue;
            };
            match validate(raw) {
                Ok(symbol) if !symbols.contains(&symbol) => symbols.push(symbol),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(user_id = %user_id, entry = %raw, error = %e, "Skipping invalid stored symbol");
                }
            }
        }

        let tier = profile.subscription_tier.unwrap_or(default_tier);

        tracing::info!(
            user_id = %user_id,
            tier = %tier,
            symbols = symbols.len(),
            "Watchlist loaded"
        );

        Ok(Self::with_symbols(user_id, tier, documents, quotes, symbols))
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Current symbols, in insertion order
    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.symbols.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.borrow().is_empty()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.borrow().contains(symbol)
    }

    /// Read-only view that is notified on every change
    pub fn subscribe(&self) -> watch::Receiver<Vec<Symbol>> {
        self.symbols.subscribe()
    }

    /// Add a symbol.
    ///
    /// Checks run in order: syntax, duplicate, size limit, existence at the
    /// provider. The remote write happens before the local set changes.
    pub async fn add(&self, raw: &str) -> Result<Symbol, WatchlistError> {
        let result = self.try_add(raw).await;
        self.record("add", &result);
        result
    }

    async fn try_add(&self, raw: &str) -> Result<Symbol, WatchlistError> {
        let symbol = validate(raw)?;

        let _guard = self.write_lock.lock().await;

        if self.contains(&symbol) {
            return Err(WatchlistError::AlreadyPresent(symbol));
        }

        if let Some(limit) = self.tier.watchlist_limit() {
            if self.len() >= limit {
                return Err(WatchlistError::LimitExceeded { limit });
            }
        }

        match self.quotes.fetch_quote(&symbol).await {
            Ok(_) => {}
            Err(QuoteError::NotFound(_)) => {
                return Err(ValidationError::UnknownSymbol(symbol).into());
            }
            Err(e) => {
                return Err(WatchlistError::StoreUnavailable(format!(
                    "could not confirm {}: {}",
                    symbol, e
                )));
            }
        }

        self.documents
            .add_to_array_field(
                &self.user_id,
                WATCHLIST_FIELD,
                Value::String(symbol.to_string()),
            )
            .await
            .map_err(|e| WatchlistError::StoreUnavailable(e.to_string()))?;

        self.symbols.send_modify(|symbols| symbols.push(symbol.clone()));

        tracing::info!(user_id = %self.user_id, symbol = %symbol, size = self.len(), "Symbol added to watchlist");
        Ok(symbol)
    }

    /// Remove a symbol; absent or malformed input reports `NotPresent`
    pub async fn remove(&self, raw: &str) -> Result<Symbol, WatchlistError> {
        let result = self.try_remove(raw).await;
        self.record("remove", &result);
        result
    }

    async fn try_remove(&self, raw: &str) -> Result<Symbol, WatchlistError> {
        let symbol = match validate(raw) {
            Ok(symbol) => symbol,
            Err(_) => return Err(WatchlistError::NotPresent(raw.trim().to_string())),
        };

        let _guard = self.write_lock.lock().await;

        if !self.contains(&symbol) {
            return Err(WatchlistError::NotPresent(symbol.to_string()));
        }

        self.documents
            .remove_from_array_field(
                &self.user_id,
                WATCHLIST_FIELD,
                Value::String(symbol.to_string()),
            )
            .await
            .map_err(|e| WatchlistError::StoreUnavailable(e.to_string()))?;

        self.symbols.send_modify(|symbols| symbols.retain(|s| *s != symbol));

        tracing::info!(user_id = %self.user_id, symbol = %symbol, size = self.len(), "Symbol removed from watchlist");
        Ok(symbol)
    }

    fn record(&self, op: &'static str, result: &Result<Symbol, WatchlistError>) {
        match result {
            Ok(_) => {
                record_mutation(op, "ok");
                set_gauge(GaugeMetric::WatchlistSize, self.user_id.as_str(), self.len() as f64);
            }
            Err(e) => {
                record_mutation(op, e.kind());
                tracing::debug!(user_id = %self.user_id, op, error = %e, "Watchlist mutation rejected");
            }
        }
    }
}

impl std::fmt::Debug for WatchlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistStore")
            .field("user_id", &self.user_id)
            .field("tier", &self.tier)
            .field("symbols", &*self.symbols.borrow())
            .finish()
    }
}
