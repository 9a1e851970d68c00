//! End-to-end integration tests

use quanta_watch::config::{BackendMode, Config};
use quanta_watch::dashboard::{Backend, Dashboard, ViewEvent};
use quanta_watch::quote::MockQuoteClient;
use quanta_watch::refresh::SchedulerStatus;
use quanta_watch::session::{StaticSession, UserId};
use quanta_watch::store::{DocumentStore, FileDocumentStore, DEMO_USER_ID};
use quanta_watch::symbol::validate;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[test]
fn test_config_example_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();
    assert_eq!(config.backend.mode, BackendMode::Mock);
    assert_eq!(config.refresh.interval(), Duration::from_secs(60));
    assert_eq!(config.session.user_id, DEMO_USER_ID);
}

#[tokio::test(start_paused = true)]
async fn test_mock_dashboard_add_refreshes_view() {
    let config = Config::default();
    let dashboard = Dashboard::from_config(&config).unwrap();
    let mut view = dashboard.open(UserId::new(DEMO_USER_ID)).await.unwrap();

    let first = view.subscription.next_snapshot().await.unwrap();
    assert_eq!(first.quotes.len(), 3);

    view.watchlist.add("tsla").await.unwrap();

    let second = view.subscription.next_snapshot().await.unwrap();
    assert_eq!(second.cycle, 2);
    assert!(second.quote(&validate("TSLA").unwrap()).is_some());
    assert_eq!(second.quotes.len(), 4);

    let final_state = view.close().join().await;
    assert_eq!(final_state.status, SchedulerStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_emptying_watchlist_suspends_view() {
    let dashboard = Dashboard::from_config(&Config::default()).unwrap();
    let mut view = dashboard.open(UserId::new(DEMO_USER_ID)).await.unwrap();
    view.subscription.next_snapshot().await.unwrap();

    let mut state = view.subscription.watch_state();
    for symbol in view.watchlist.symbols() {
        view.watchlist.remove(symbol.as_str()).await.unwrap();
    }

    state
        .wait_for(|s| s.status == SchedulerStatus::Suspended)
        .await
        .unwrap();
    assert_eq!(view.watchlist.len(), 0);
}

#[tokio::test]
async fn test_file_store_persists_across_dashboards() {
    let dir = tempfile::tempdir().unwrap();
    let documents = Arc::new(FileDocumentStore::new(dir.path().join("profiles.json")));
    let user = UserId::new("file-user");
    let config = Config::default();

    {
        let backend = Backend::new(Arc::new(MockQuoteClient::demo()), documents.clone());
        let dashboard = Dashboard::with_backend(backend, &config);
        let watchlist = dashboard.load_watchlist(user.clone()).await.unwrap();
        watchlist.add("AAPL").await.unwrap();
        watchlist.add("NVDA").await.unwrap();
        watchlist.remove("AAPL").await.unwrap();
    }

    let backend = Backend::new(Arc::new(MockQuoteClient::demo()), documents.clone());
    let dashboard = Dashboard::with_backend(backend, &config);
    let watchlist = dashboard.load_watchlist(user.clone()).await.unwrap();

    assert_eq!(watchlist.symbols(), vec![validate("NVDA").unwrap()]);
    let profile = documents.get(&user).await.unwrap();
    assert!(profile.updated_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_follow_session_tracks_sign_in_switch_and_sign_out() {
    let quotes = Arc::new(MockQuoteClient::demo());
    let backend = Backend::new(
        quotes.clone(),
        Arc::new(quanta_watch::store::MemoryDocumentStore::demo()),
    );
    let dashboard = Dashboard::with_backend(backend, &Config::default());
    let session = StaticSession::signed_out();
    let shutdown = CancellationToken::new();
    let mut seen = Vec::new();

    let script = async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        session.sign_in(UserId::new(DEMO_USER_ID));
        // Cycles at 10s and 70s
        tokio::time::sleep(Duration::from_secs(100)).await;
        session.sign_in(UserId::new("empty-user"));
        tokio::time::sleep(Duration::from_secs(100)).await;
        session.sign_out();
        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown.cancel();
    };

    let follow = dashboard.follow_session(&session, shutdown.clone(), |user, event| match event {
        ViewEvent::Snapshot(snapshot) => {
            seen.push((user.clone(), snapshot.cycle, snapshot.quotes.len()));
        }
        ViewEvent::OpenFailed(e) => panic!("unexpected open failure: {e}"),
    });

    tokio::join!(follow, script);

    assert_eq!(
        seen,
        vec![
            (UserId::new(DEMO_USER_ID), 1, 3),
            (UserId::new(DEMO_USER_ID), 2, 3),
        ]
    );
    assert_eq!(quotes.calls(), 6);
}

#[tokio::test]
async fn test_follow_session_signed_out_makes_no_calls() {
    let quotes = Arc::new(MockQuoteClient::demo());
    let backend = Backend::new(
        quotes.clone(),
        Arc::new(quanta_watch::store::MemoryDocumentStore::demo()),
    );
    let dashboard = Dashboard::with_backend(backend, &Config::default());
    let session = StaticSession::signed_out();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    dashboard
        .follow_session(&session, shutdown, |_, _| panic!("no event expected"))
        .await;

    assert_eq!(quotes.calls(), 0);
}
