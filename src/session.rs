//! Session collaborator
//!
//! Authentication lives outside this crate. The engine only needs the
//! current user and a push notification when it changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// Opaque identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Source of authentication state
pub trait SessionProvider: Send + Sync {
    /// The signed-in user, if any
    fn current_user_id(&self) -> Option<UserId>;

    /// Whether a user is signed in
    fn is_authenticated(&self) -> bool {
        self.current_user_id().is_some()
    }

    /// Receiver notified on every sign-in, sign-out, or user switch
    fn changes(&self) -> watch::Receiver<Option<UserId>>;
}

/// In-process session driven by explicit sign-in/sign-out calls
#[derive(Debug)]
pub struct StaticSession {
    tx: watch::Sender<Option<UserId>>,
}

impl StaticSession {
    /// Session with nobody signed in
    pub fn signed_out() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Session already signed in as `user_id`
    pub fn signed_in(user_id: UserId) -> Self {
        let (tx, _rx) = watch::channel(Some(user_id));
        Self { tx }
    }

    pub fn sign_in(&self, user_id: UserId) {
        tracing::info!(user_id = %user_id, "Session signed in");
        self.tx.send_replace(Some(user_id));
    }

    pub fn sign_out(&self) {
        tracing::info!("Session signed out");
        self.tx.send_replace(None);
    }
}

impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    fn changes(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}
