//! Refresh scheduler integration tests
//!
//! All tests run on paused time so interval behaviour is exact.

use quanta_watch::fetch::BatchFetcher;
use quanta_watch::quote::{MockQuoteClient, QuoteError};
use quanta_watch::refresh::{RefreshScheduler, SchedulerStatus};
use quanta_watch::session::UserId;
use quanta_watch::store::MemoryDocumentStore;
use quanta_watch::symbol::{validate, Symbol};
use quanta_watch::watchlist::{Tier, WatchlistStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

const INTERVAL: Duration = Duration::from_secs(60);

fn sym(raw: &str) -> Symbol {
    validate(raw).unwrap()
}

fn scheduler(client: Arc<MockQuoteClient>) -> RefreshScheduler {
    RefreshScheduler::with_interval(Arc::new(BatchFetcher::new(client)), INTERVAL)
}

#[tokio::test(start_paused = true)]
async fn test_exactly_one_cycle_per_interval() {
    let client = Arc::new(MockQuoteClient::demo());
    let (_tx, rx) = watch::channel(vec![sym("AAPL"), sym("MSFT")]);
    let mut sub = scheduler(client.clone()).subscribe(rx);

    let first = sub.next_snapshot().await.unwrap();
    assert_eq!(first.cycle, 1);
    assert!(first.quote(&sym("AAPL")).is_some());
    assert!(first.quote(&sym("MSFT")).is_some());

    tokio::time::sleep(INTERVAL * 2 - Duration::from_secs(1)).await;

    let second = sub.try_next_snapshot().expect("second cycle");
    assert_eq!(second.cycle, 2);
    assert!(sub.try_next_snapshot().is_none());
    assert_eq!(client.calls(), 4);
    assert_eq!(sub.state().cycle_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_cycle_never_overlaps() {
    let client = Arc::new(MockQuoteClient::demo().with_latency(Duration::from_secs(90)));
    let (_tx, rx) = watch::channel(vec![sym("AAPL")]);
    let mut sub = scheduler(client.clone()).subscribe(rx);

    let start = Instant::now();
    sub.next_snapshot().await.unwrap();
    sub.next_snapshot().await.unwrap();

    // Timer is armed only after publish: 90s fetch + 60s wait + 90s fetch
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(240) && elapsed < Duration::from_secs(241));
    assert_eq!(client.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_detach_mid_cycle_discards_result() {
    let client = Arc::new(MockQuoteClient::demo().with_latency(Duration::from_secs(5)));
    let (_tx, rx) = watch::channel(vec![sym("AAPL"), sym("MSFT")]);
    let mut sub = scheduler(client.clone()).subscribe(rx);

    sub.next_snapshot().await.unwrap();
    let state = sub.watch_state();

    // Second cycle starts at 65s and would publish at 70s
    tokio::time::sleep(Duration::from_secs(62)).await;
    assert_eq!(client.calls(), 4);

    let final_state = sub.detach().join().await;

    assert_eq!(final_state.status, SchedulerStatus::Stopped);
    assert_eq!(final_state.cycle_count, 1);
    assert_eq!(state.borrow().cycle_count, 1);

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(client.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_remove_during_cycle_is_picked_up_next_cycle() {
    let client = Arc::new(MockQuoteClient::demo().with_latency(Duration::from_secs(5)));
    let store = WatchlistStore::load(
        UserId::new("mock-test-user"),
        Arc::new(MemoryDocumentStore::demo()),
        client.clone(),
        Tier::Free,
    )
    .await
    .unwrap();
    let mut sub = scheduler(client.clone()).subscribe(store.subscribe());

    let start = Instant::now();
    tokio::time::sleep(Duration::from_secs(2)).await;
    store.remove("MSFT").await.unwrap();

    let first = sub.next_snapshot().await.unwrap();
    assert_eq!(first.quotes.len() + first.failures.len(), 3);
    assert!(first.quote(&sym("MSFT")).is_some());

    let second = sub.next_snapshot().await.unwrap();
    assert_eq!(second.cycle, 2);
    assert!(second.quote(&sym("MSFT")).is_none());
    assert_eq!(second.symbols().count(), 2);
    assert!(start.elapsed() < INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_add_triggers_refresh_and_rearms_timer() {
    let client = Arc::new(MockQuoteClient::demo());
    let (tx, rx) = watch::channel(vec![sym("AAPL")]);
    let mut sub = scheduler(client.clone()).subscribe(rx);
    sub.next_snapshot().await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    tx.send_modify(|symbols| symbols.push(sym("TSLA")));

    let refreshed = sub.next_snapshot().await.unwrap();
    assert_eq!(refreshed.cycle, 2);
    assert!(refreshed.quote(&sym("TSLA")).is_some());

    let start = Instant::now();
    sub.next_snapshot().await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= INTERVAL && elapsed < INTERVAL + Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_partial_failures_are_published() {
    let client = Arc::new(
        MockQuoteClient::demo().with_failure(sym("GOOGL"), QuoteError::RateLimited),
    );
    let (_tx, rx) = watch::channel(vec![sym("AAPL"), sym("GOOGL"), sym("ZZZZ")]);
    let mut sub = scheduler(client).subscribe(rx);

    let snapshot = sub.next_snapshot().await.unwrap();

    assert_eq!(snapshot.quotes.len(), 1);
    assert_eq!(snapshot.failure(&sym("GOOGL")), Some(&QuoteError::RateLimited));
    assert_eq!(
        snapshot.failure(&sym("ZZZZ")),
        Some(&QuoteError::NotFound(sym("ZZZZ")))
    );
    assert_eq!(sub.status(), SchedulerStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_raises_configuration_fault() {
    let client = Arc::new(
        MockQuoteClient::demo().with_failure(sym("MSFT"), QuoteError::Unauthorized),
    );
    let scheduler = scheduler(client);
    let mut faults = scheduler.faults();
    let (_tx, rx) = watch::channel(vec![sym("AAPL"), sym("MSFT")]);
    let mut sub = scheduler.subscribe(rx);

    let snapshot = sub.next_snapshot().await.unwrap();
    let fault = faults.recv().await.unwrap();

    assert_eq!(fault.subscription_id, sub.id());
    assert_eq!(fault.symbols, vec![sym("MSFT")]);
    assert_eq!(snapshot.failure(&sym("MSFT")), Some(&QuoteError::Unauthorized));

    // The subscription keeps cycling
    let next = sub.next_snapshot().await.unwrap();
    assert_eq!(next.cycle, 2);
}

#[tokio::test(start_paused = true)]
async fn test_subscriptions_are_independent() {
    let client = Arc::new(MockQuoteClient::demo());
    let scheduler = scheduler(client);
    let (_a_tx, a_rx) = watch::channel(vec![sym("AAPL")]);
    let (_b_tx, b_rx) = watch::channel(vec![sym("TSLA")]);

    let mut a = scheduler.subscribe(a_rx);
    let mut b = scheduler.subscribe(b_rx);
    assert_ne!(a.id(), b.id());

    a.next_snapshot().await.unwrap();
    b.next_snapshot().await.unwrap();
    drop(a);

    let next = b.next_snapshot().await.unwrap();
    assert_eq!(next.cycle, 2);
    assert!(next.quote(&sym("TSLA")).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_closed_watchlist_keeps_last_symbols() {
    let client = Arc::new(MockQuoteClient::demo());
    let (tx, rx) = watch::channel(vec![sym("AAPL")]);
    let mut sub = scheduler(client).subscribe(rx);
    sub.next_snapshot().await.unwrap();

    drop(tx);

    let next = sub.next_snapshot().await.unwrap();
    assert_eq!(next.cycle, 2);
    assert!(next.quote(&sym("AAPL")).is_some());
}
