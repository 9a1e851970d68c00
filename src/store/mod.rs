//! Profile document store
//!
//! The per-user profile record lives in an external key-value document
//! store. Only the watchlist store writes to it.

mod document;
mod file;
mod memory;

pub use file::FileDocumentStore;
pub use memory::{MemoryDocumentStore, DEMO_USER_ID};

use crate::session::UserId;
use crate::watchlist::Tier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Field holding the watchlist symbols
pub const WATCHLIST_FIELD: &str = "watchlist";
/// Field stamped on every mutation
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A user's profile record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_strategy: Option<String>,
    /// Unrecognized tier names decode as `None`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_tier"
    )]
    pub subscription_tier: Option<Tier>,
    /// Raw stored entries; the watchlist store keeps the valid strings on load
    #[serde(default, deserialize_with = "lenient_array")]
    pub watchlist: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn lenient_tier<'de, D>(deserializer: D) -> Result<Option<Tier>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => {
            let tier = Tier::from_name(&name);
            if tier.is_none() {
                tracing::warn!(tier = %name, "Ignoring unknown stored subscription tier");
            }
            tier
        }
        Some(other) => {
            tracing::warn!(tier = %other, "Ignoring non-string stored subscription tier");
            None
        }
    })
}

fn lenient_array<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(value = %other, "Ignoring non-array stored watchlist");
            Vec::new()
        }
    })
}

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or refusing requests
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    /// Local persistence failure
    #[error("document store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored document could not be decoded or encoded
    #[error("malformed profile document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Trait for profile document stores
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a user's profile; a missing profile reads as an empty record
    async fn get(&self, user_id: &UserId) -> Result<ProfileRecord, StoreError>;

    /// Write one field; with `merge = false` the document is replaced
    async fn set_field(
        &self,
        user_id: &UserId,
        field: &str,
        value: serde_json::Value,
        merge: bool,
    ) -> Result<(), StoreError>;

    /// Append `value` to an array field; no-op if already present
    async fn add_to_array_field(
        &self,
        user_id: &UserId,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Remove every occurrence of `value` from an array field
    async fn remove_from_array_field(
        &self,
        user_id: &UserId,
        field: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError>;
}
