//! Watchlist types and errors

use crate::symbol::{InvalidSymbolError, Symbol};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subscription tier; decides how many symbols a watchlist may hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Premium,
}

impl Tier {
    /// Parse a tier name, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Tier> {
        match name.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "pro" => Some(Tier::Pro),
            "premium" => Some(Tier::Premium),
            _ => None,
        }
    }

    /// Maximum watchlist size, `None` for unlimited
    pub fn watchlist_limit(&self) -> Option<usize> {
        match self {
            Tier::Free => Some(10),
            Tier::Pro => Some(50),
            Tier::Premium => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Premium => "premium",
        };
        f.write_str(name)
    }
}

/// Why a symbol could not be accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Malformed ticker
    #[error(transparent)]
    Syntax(#[from] InvalidSymbolError),
    /// Well-formed ticker the provider does not know
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(Symbol),
}

/// Watchlist mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchlistError {
    #[error("{0} is already on the watchlist")]
    AlreadyPresent(Symbol),
    #[error("'{0}' is not on the watchlist")]
    NotPresent(String),
    #[error("watchlist is full ({limit} symbols)")]
    LimitExceeded { limit: usize },
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl WatchlistError {
    /// Short label used as a metrics dimension
    pub fn kind(&self) -> &'static str {
        match self {
            WatchlistError::AlreadyPresent(_) => "already_present",
            WatchlistError::NotPresent(_) => "not_present",
            WatchlistError::LimitExceeded { .. } => "limit_exceeded",
            WatchlistError::ValidationFailed(_) => "validation_failed",
            WatchlistError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<InvalidSymbolError> for WatchlistError {
    fn from(err: InvalidSymbolError) -> Self {
        WatchlistError::ValidationFailed(ValidationError::Syntax(err))
    }
}
