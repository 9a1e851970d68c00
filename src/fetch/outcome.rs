//! Per-batch fetch results

use crate::quote::{Quote, QuoteError};
use crate::symbol::Symbol;

/// Result of one batch fetch.
///
/// Every requested symbol appears exactly once, as a quote or as a typed
/// failure, in the order it was requested.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    entries: Vec<(Symbol, Result<Quote, QuoteError>)>,
}

impl FetchOutcome {
    /// Create an empty outcome
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for `symbol`, replacing any earlier entry
    pub(crate) fn record(&mut self, symbol: Symbol, result: Result<Quote, QuoteError>) {
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some(entry) => entry.1 = result,
            None => self.entries.push((symbol, result)),
        }
    }

    /// Number of symbols in the outcome
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch was empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requested symbols, in request order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|(s, _)| s)
    }

    /// Result for one symbol
    pub fn get(&self, symbol: &Symbol) -> Option<&Result<Quote, QuoteError>> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, result)| result)
    }

    /// Every entry, in request order
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Result<Quote, QuoteError>)> {
        self.entries.iter().map(|(s, r)| (s, r))
    }

    /// Successful quotes, in request order
    pub fn successes(&self) -> impl Iterator<Item = &Quote> {
        self.entries.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    /// Failed symbols with their reasons, in request order
    pub fn failures(&self) -> impl Iterator<Item = (&Symbol, &QuoteError)> {
        self.entries
            .iter()
            .filter_map(|(s, r)| r.as_ref().err().map(|e| (s, e)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when the batch was non-empty and nothing succeeded
    pub fn is_total_failure(&self) -> bool {
        !self.is_empty() && self.success_count() == 0
    }

    /// Split into successes and failures, preserving request order
    pub fn into_parts(self) -> (Vec<Quote>, Vec<(Symbol, QuoteError)>) {
        let mut quotes = Vec::new();
        let mut failures = Vec::new();
        for (symbol, result) in self.entries {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(error) => failures.push((symbol, error)),
            }
        }
        (quotes, failures)
    }
}
