//! Dashboard wiring
//!
//! Builds the quote client and document store once from configuration and
//! ties a user's watchlist to a refresh subscription. `follow_session`
//! reacts to pushed session changes instead of polling auth state.

use crate::config::{BackendMode, Config, ConfigError};
use crate::fetch::BatchFetcher;
use crate::quote::{FinnhubClient, FinnhubConfig, MockQuoteClient, QuoteClient};
use crate::refresh::{Detached, RefreshScheduler, RefreshSnapshot, Subscription};
use crate::session::{SessionProvider, UserId};
use crate::store::{DocumentStore, FileDocumentStore, MemoryDocumentStore};
use crate::watchlist::{Tier, WatchlistError, WatchlistStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// External collaborators selected at construction time
#[derive(Clone)]
pub struct Backend {
    pub quotes: Arc<dyn QuoteClient>,
    pub documents: Arc<dyn DocumentStore>,
}

impl Backend {
    pub fn new(quotes: Arc<dyn QuoteClient>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { quotes, documents }
    }

    /// Demo quotes and an in-memory store seeded with the demo user
    pub fn mock() -> Self {
        Self::new(
            Arc::new(MockQuoteClient::demo()),
            Arc::new(MemoryDocumentStore::demo()),
        )
    }

    /// Select the backend named by `backend.mode`
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match config.backend.mode {
            BackendMode::Mock => {
                tracing::info!("Using mock backend");
                Ok(Self::mock())
            }
            BackendMode::Live => {
                let api_key = config
                    .provider
                    .resolve_api_key()
                    .ok_or(ConfigError::MissingApiKey)?;
                let client = FinnhubClient::with_config(
                    FinnhubConfig::new(api_key)
                        .base_url(config.provider.base_url.clone())
                        .timeout(config.provider.timeout()),
                );
                tracing::info!(
                    base_url = %client.base_url(),
                    store = %config.store.path.display(),
                    "Using live backend"
                );
                Ok(Self::new(
                    Arc::new(client),
                    Arc::new(FileDocumentStore::new(config.store.path.clone())),
                ))
            }
        }
    }
}

/// A signed-in user's watchlist and its refresh subscription
pub struct DashboardView {
    pub watchlist: Arc<WatchlistStore>,
    pub subscription: Subscription,
}

impl DashboardView {
    pub fn user_id(&self) -> &UserId {
        self.watchlist.user_id()
    }

    /// Stop refreshing; pending results are discarded
    pub fn close(self) -> Detached {
        tracing::info!(user_id = %self.user_id(), "Closing dashboard view");
        self.subscription.detach()
    }
}

/// What `follow_session` reports to its host
#[derive(Debug)]
pub enum ViewEvent<'a> {
    /// A refresh cycle completed for the open view
    Snapshot(&'a RefreshSnapshot),
    /// The signed-in user's view could not be opened; retried on the next session change
    OpenFailed(&'a WatchlistError),
}

/// Entry point tying watchlists to the refresh scheduler
pub struct Dashboard {
    backend: Backend,
    fetcher: Arc<BatchFetcher>,
    scheduler: RefreshScheduler,
    default_tier: Tier,
}

impl Dashboard {
    pub fn new(backend: Backend, scheduler: RefreshScheduler, fetcher: Arc<BatchFetcher>, default_tier: Tier) -> Self {
        Self {
            backend,
            fetcher,
            scheduler,
            default_tier,
        }
    }

    /// Build the backend, fetcher and scheduler from configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let backend = Backend::from_config(config)?;
        Ok(Self::with_backend(backend, config))
    }

    /// Use `backend` with the refresh and watchlist settings from `config`
    pub fn with_backend(backend: Backend, config: &Config) -> Self {
        let fetcher = Arc::new(BatchFetcher::with_config(
            Arc::clone(&backend.quotes),
            config.refresh.fetch_config(),
        ));
        let scheduler = RefreshScheduler::with_interval(Arc::clone(&fetcher), config.refresh.interval());
        Self::new(backend, scheduler, fetcher, config.watchlist.default_tier)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn fetcher(&self) -> &Arc<BatchFetcher> {
        &self.fetcher
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    /// Read the user's watchlist from the document store
    pub async fn load_watchlist(&self, user_id: UserId) -> Result<WatchlistStore, WatchlistError> {
        WatchlistStore::load(
            user_id,
            Arc::clone(&self.backend.documents),
            Arc::clone(&self.backend.quotes),
            self.default_tier,
        )
        .await
    }

    /// Load the watchlist and start refreshing it
    pub async fn open(&self, user_id: UserId) -> Result<DashboardView, WatchlistError> {
        let watchlist = Arc::new(self.load_watchlist(user_id).await?);
        let subscription = self.scheduler.subscribe(watchlist.subscribe());
        tracing::info!(
            user_id = %watchlist.user_id(),
            subscription_id = %subscription.id(),
            "Dashboard view opened"
        );
        Ok(DashboardView {
            watchlist,
            subscription,
        })
    }

    /// Keep one view open for whoever is signed in until `shutdown`.
    ///
    /// Sign-in opens a view, sign-out or a user switch closes it. Every
    /// published snapshot and every failed open is passed to `on_event`.
    pub async fn follow_session<F>(
        &self,
        session: &dyn SessionProvider,
        shutdown: CancellationToken,
        mut on_event: F,
    ) where
        F: FnMut(&UserId, ViewEvent<'_>),
    {
        let mut changes = session.changes();
        let mut signed_in = changes.borrow_and_update().clone();
        let mut opened_for: Option<UserId> = None;
        let mut view: Option<DashboardView> = None;

        loop {
            if opened_for != signed_in {
                if let Some(old) = view.take() {
                    drop(old.close());
                }
                opened_for = signed_in.clone();
                if let Some(user_id) = signed_in.clone() {
                    match self.open(user_id.clone()).await {
                        Ok(opened) => view = Some(opened),
                        Err(e) => {
                            tracing::warn!(user_id = %user_id, error = %e, "Could not open dashboard view");
                            on_event(&user_id, ViewEvent::OpenFailed(&e));
                        }
                    }
                }
            }

            let event = tokio::select! {
                biased;
                _ = shutdown.cancelled() => SessionEvent::Shutdown,
                changed = changes.changed() => match changed {
                    Ok(()) => SessionEvent::Changed,
                    Err(_) => SessionEvent::Shutdown,
                },
                snapshot = next_snapshot(&mut view), if view.is_some() => SessionEvent::Snapshot(snapshot),
            };

            match event {
                SessionEvent::Shutdown => break,
                SessionEvent::Changed => {
                    signed_in = changes.borrow_and_update().clone();
                    if view.is_none() {
                        // Nothing open for the current user; retry the open
                        opened_for = None;
                    }
                }
                SessionEvent::Snapshot(Some(snapshot)) => {
                    if let Some(user_id) = opened_for.as_ref() {
                        on_event(user_id, ViewEvent::Snapshot(&snapshot));
                    }
                }
                SessionEvent::Snapshot(None) => {
                    // Task ended on its own; wait for the next session change
                    tracing::warn!("Refresh subscription ended unexpectedly");
                    view = None;
                }
            }
        }

        if let Some(view) = view.take() {
            view.close().join().await;
        }
    }
}

enum SessionEvent {
    Shutdown,
    Changed,
    Snapshot(Option<RefreshSnapshot>),
}

async fn next_snapshot(view: &mut Option<DashboardView>) -> Option<RefreshSnapshot> {
    match view {
        Some(view) => view.subscription.next_snapshot().await,
        None => None,
    }
}
