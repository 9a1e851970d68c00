//! Ticker symbol validation and normalization

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum ticker length accepted by the provider
pub const MAX_SYMBOL_LEN: usize = 5;

/// A normalized ticker: 1-5 uppercase ASCII letters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

/// Why a raw ticker string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSymbolError {
    #[error("symbol is empty")]
    Empty,
    #[error("symbol '{0}' is longer than 5 letters")]
    TooLong(String),
    #[error("symbol '{input}' contains non-letter character '{found}'")]
    InvalidCharacter { input: String, found: char },
}

/// Validate a raw ticker string and normalize it to uppercase.
///
/// Surrounding whitespace is trimmed first. Only ASCII letters are
/// accepted, between 1 and [`MAX_SYMBOL_LEN`] of them.
pub fn validate(raw: &str) -> Result<Symbol, InvalidSymbolError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(InvalidSymbolError::Empty);
    }

    if let Some(found) = trimmed.chars().find(|c| !c.is_ascii_alphabetic()) {
        return Err(InvalidSymbolError::InvalidCharacter {
            input: trimmed.to_string(),
            found,
        });
    }

    // All chars are ASCII here, so byte length equals char count
    if trimmed.len() > MAX_SYMBOL_LEN {
        return Err(InvalidSymbolError::TooLong(trimmed.to_string()));
    }

    Ok(Symbol(trimmed.to_ascii_uppercase()))
}

impl Symbol {
    /// Borrow the normalized ticker
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = InvalidSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = InvalidSymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}
