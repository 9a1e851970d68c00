//! Quote client module
//!
//! One request per symbol against the external quote provider, with
//! provider failures translated into the closed [`QuoteError`] taxonomy.

mod finnhub;
mod mock;
mod types;

pub use finnhub::{FinnhubClient, FinnhubConfig, FINNHUB_API_URL};
pub use mock::MockQuoteClient;
pub use types::{Quote, QuoteError};

use crate::symbol::Symbol;
use async_trait::async_trait;

/// Trait for quote provider adapters
#[async_trait]
pub trait QuoteClient: Send + Sync {
    /// Fetch the current quote for a single symbol
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError>;
}
