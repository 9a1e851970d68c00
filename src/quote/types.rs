//! Quote types

use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point-in-time price snapshot for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Normalized ticker
    pub symbol: Symbol,
    /// Company name, or the ticker when the name could not be resolved
    pub display_name: String,
    /// Current price
    pub price: f64,
    /// Change since previous close
    pub absolute_change: f64,
    /// Change since previous close, in percent
    pub percent_change: f64,
    /// Local retrieval time (the provider does not guarantee an exchange time)
    pub observed_at: DateTime<Utc>,
}

/// Closed set of per-symbol quote failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// Provider has no tradable instrument for the symbol
    #[error("no tradable instrument found for {0}")]
    NotFound(Symbol),
    /// Request quota exhausted (HTTP 429)
    #[error("quote provider rate limit exceeded")]
    RateLimited,
    /// Credentials rejected (HTTP 401); no retry can succeed
    #[error("quote provider rejected the API credentials")]
    Unauthorized,
    /// Network, timeout, or any other provider failure
    #[error("transient quote provider error: {0}")]
    Transient(String),
}

impl QuoteError {
    /// Whether the caller may retry the request
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuoteError::Transient(_))
    }

    /// Whether this signals a configuration problem for the whole process
    pub fn is_fatal(&self) -> bool {
        matches!(self, QuoteError::Unauthorized)
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            QuoteError::NotFound(_) => "not_found",
            QuoteError::RateLimited => "rate_limited",
            QuoteError::Unauthorized => "unauthorized",
            QuoteError::Transient(_) => "transient",
        }
    }
}
