//! Finnhub REST quote client
//!
//! Prices come from `/quote`. `currentPrice == 0` (or a missing price) is
//! the provider's way of saying the symbol is unknown. The company name is
//! looked up from `/stock/profile2` on a best-effort basis: when that call
//! fails the ticker itself is used as display name.

use super::{Quote, QuoteClient, QuoteError};
use crate::symbol::Symbol;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Finnhub API base URL
pub const FINNHUB_API_URL: &str = "https://finnhub.io/api/v1";

const QUOTE_PATH: &str = "/quote";
const PROFILE_PATH: &str = "/stock/profile2";

/// Configuration for the Finnhub client
#[derive(Clone)]
pub struct FinnhubConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// API token sent as the `token` query parameter
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl FinnhubConfig {
    /// Create a config for the public endpoint with the given token
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: FINNHUB_API_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Point the client at a different base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for FinnhubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinnhubConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Response from the `/quote` endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
}

/// Response from the `/stock/profile2` endpoint
#[derive(Debug, Deserialize)]
struct ProfileResponse {
    name: Option<String>,
}

/// Client for the Finnhub quote API
pub struct FinnhubClient {
    config: FinnhubConfig,
    client: Client,
    /// Resolved company names; names are cosmetic and stable between cycles
    names: RwLock<HashMap<Symbol, String>>,
}

impl FinnhubClient {
    /// Create a client for the public endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(FinnhubConfig::new(api_key))
    }

    /// Create a client with custom configuration
    pub fn with_config(config: FinnhubConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            config,
            client,
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Issue a GET for `path` with the symbol and token as query parameters
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: &Symbol,
    ) -> Result<T, QuoteError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol.as_str()),
                ("token", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(request_error)?;

        classify_status(response.status())?;

        response
            .json::<T>()
            .await
            .map_err(|e| QuoteError::Transient(format!("malformed response: {}", e.without_url())))
    }

    /// Resolve the display name, falling back to the ticker on any failure
    async fn display_name(&self, symbol: &Symbol) -> String {
        if let Some(name) = self.names.read().await.get(symbol) {
            return name.clone();
        }

        match self.get_json::<ProfileResponse>(PROFILE_PATH, symbol).await {
            Ok(ProfileResponse { name: Some(name) }) if !name.trim().is_empty() => {
                let name = name.trim().to_string();
                self.names
                    .write()
                    .await
                    .insert(symbol.clone(), name.clone());
                name
            }
            Ok(_) => symbol.to_string(),
            Err(e) => {
                tracing::debug!(symbol = %symbol, error = %e, "Profile lookup failed, using ticker as name");
                symbol.to_string()
            }
        }
    }
}

#[async_trait]
impl QuoteClient for FinnhubClient {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        tracing::debug!(symbol = %symbol, "Fetching quote from Finnhub");

        let raw: QuoteResponse = self.get_json(QUOTE_PATH, symbol).await?;

        let price = match raw.c {
            Some(price) if price != 0.0 && price.is_finite() => price,
            _ => return Err(QuoteError::NotFound(symbol.clone())),
        };

        let display_name = self.display_name(symbol).await;

        Ok(Quote {
            symbol: symbol.clone(),
            display_name,
            price,
            absolute_change: raw.d.unwrap_or(0.0),
            percent_change: raw.dp.unwrap_or(0.0),
            observed_at: Utc::now(),
        })
    }
}

/// Map an HTTP status onto the quote error taxonomy
fn classify_status(status: StatusCode) -> Result<(), QuoteError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::TOO_MANY_REQUESTS => Err(QuoteError::RateLimited),
        StatusCode::UNAUTHORIZED => Err(QuoteError::Unauthorized),
        other => Err(QuoteError::Transient(format!("HTTP {}", other))),
    }
}

/// Map a transport failure to `Transient`, never echoing the token-bearing URL
fn request_error(err: reqwest::Error) -> QuoteError {
    if err.is_timeout() {
        QuoteError::Transient("request timed out".to_string())
    } else {
        QuoteError::Transient(format!("request failed: {}", err.without_url()))
    }
}
