//! JSON file document store
//!
//! All profiles live in one JSON object keyed by user id. Every mutation
//! rewrites the file through a temporary sibling and a rename.

use super::document::{self, Document};
use super::{DocumentStore, ProfileRecord, StoreError};
use crate::session::UserId;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Documents = BTreeMap<String, Document>;

/// Document store persisted to a local JSON file
#[derive(Debug)]
pub struct FileDocumentStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Create a store backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Documents, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Documents::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Documents::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, documents: &Documents) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(documents)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn mutate<F>(&self, user_id: &UserId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Document),
    {
        let _guard = self.lock.lock().await;
        let mut documents = self.load().await?;
        let doc = documents.entry(user_id.to_string()).or_default();
        apply(doc);
        document::stamp(doc);
        self.save(&documents).await?;
        tracing::debug!(user_id = %user_id, path = %self.path.display(), "Profile document written");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self, user_id: &UserId) -> Result<ProfileRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let documents = self.load().await?;
        document::to_record(user_id, documents.get(user_id.as_str()))
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
