//! In-memory document store
//!
//! Backs the mock backend. Can be switched offline to exercise the
//! unavailable-store paths.

use super::document::{self, Document};
use super::{DocumentStore, ProfileRecord, StoreError};
use crate::session::UserId;
use crate::watchlist::Tier;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// User seeded into the demo store
pub const DEMO_USER_ID: &str = "mock-test-user";

/// Document store held in process memory
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<UserId, Document>>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the demo user and a three-symbol watchlist
    pub fn demo() -> Self {
        let profile = ProfileRecord {
            uid: DEMO_USER_ID.to_string(),
            email: Some("test@quanta.com".to_string()),
            display_name: Some("Test User".to_string()),
            monthly_budget: Some(5000.0),
            investment_strategy: Some("growth".to_string()),
            subscription_tier: Some(Tier::Free),
            watchlist: vec!["AAPL".into(), "GOOGL".into(), "MSFT".into()],
            updated_at: None,
        };
        Self::new().with_profile(UserId::new(DEMO_USER_ID), profile)
    }

    /// Seed a profile
    pub fn with_profile(mut self, user_id: UserId, profile: ProfileRecord) -> Self {
        if let Ok(Value::Object(doc)) = serde_json::to_value(profile) {
            self.documents.get_mut().insert(user_id, doc);
        }
        self
    }

    /// Simulate an outage: every call fails with `Unavailable` while set
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful mutations
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    async fn mutate<F>(&self, user_id: &UserId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Document),
    {
        self.check_online()?;
        let mut documents = self.documents.write().await;
        let doc = documents.entry(user_id.clone()).or_default();
        apply(doc);
        document::stamp(doc);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, user_id: &UserId) -> Result<ProfileRecord, StoreError> {
        self.check_online()?;
        let documents = self.documents.read().await;
        document::to_record(user_id, documents.get(user_id))
    }

    async fn set_field(
        &self,
        user_id: &UserId,
        field: &str,
        value: Value,
        merge: bool,
    ) -> Result<(), StoreError> {
        self.mutate(user_id, |doc| document::set_field(doc, field, value, merge))
            .await
    }

    async fn add_to_array_field(
        &self,
        user_id: &UserId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.mutate(user_id, |doc| document::add_to_array(doc, field, value))
            .await
    }

    async fn remove_from_array_field(
        &self,
        user_id: &UserId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.mutate(user_id, |doc| document::remove_from_array(doc, field, &value))
            .await
    }
}
