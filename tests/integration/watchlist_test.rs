//! Watchlist store integration tests

use quanta_watch::quote::MockQuoteClient;
use quanta_watch::session::UserId;
use quanta_watch::store::{DocumentStore, MemoryDocumentStore, ProfileRecord};
use quanta_watch::symbol::{validate, Symbol};
use quanta_watch::watchlist::{Tier, ValidationError, WatchlistError, WatchlistStore};
use std::sync::Arc;

const TICKERS: [&str; 12] = [
    "AAA", "BBB", "CCC", "DDD", "EEE", "FFF", "GGG", "HHH", "III", "JJJ", "KKK", "LLL",
];

fn sym(raw: &str) -> Symbol {
    validate(raw).unwrap()
}

fn quotes_for(tickers: &[&str]) -> MockQuoteClient {
    tickers.iter().fold(MockQuoteClient::new(), |client, t| {
        client.with_quote(sym(t), format!("{} Corp", t), 10.0, 0.1, 1.0)
    })
}

async fn store_with_tier(tier: Tier) -> (WatchlistStore, Arc<MemoryDocumentStore>) {
    let user = UserId::new("tier-user");
    let documents = Arc::new(MemoryDocumentStore::new().with_profile(
        user.clone(),
        ProfileRecord {
            uid: user.to_string(),
            subscription_tier: Some(tier),
            ..ProfileRecord::default()
        },
    ));
    let store = WatchlistStore::load(
        user,
        documents.clone(),
        Arc::new(quotes_for(&TICKERS)),
        Tier::Premium,
    )
    .await
    .unwrap();
    (store, documents)
}

#[tokio::test]
async fn test_free_tier_rejects_eleventh_symbol() {
    let (store, documents) = store_with_tier(Tier::Free).await;
    for ticker in &TICKERS[..10] {
        store.add(ticker).await.unwrap();
    }
    assert_eq!(store.len(), 10);

    let err = store.add(TICKERS[10]).await.unwrap_err();

    assert_eq!(err, WatchlistError::LimitExceeded { limit: 10 });
    assert_eq!(store.len(), 10);
    let profile = documents.get(store.user_id()).await.unwrap();
    assert_eq!(profile.watchlist.len(), 10);
}

#[tokio::test]
async fn test_limit_checked_before_duplicate_is_not_reached() {
    let (store, _) = store_with_tier(Tier::Free).await;
    for ticker in &TICKERS[..10] {
        store.add(ticker).await.unwrap();
    }

    // A duplicate on a full list is still reported as a duplicate
    assert_eq!(
        store.add("aaa").await,
        Err(WatchlistError::AlreadyPresent(sym("AAA")))
    );
}

#[tokio::test]
async fn test_premium_tier_is_unlimited() {
    let (store, _) = store_with_tier(Tier::Premium).await;
    for ticker in &TICKERS {
        store.add(ticker).await.unwrap();
    }
    assert_eq!(store.len(), TICKERS.len());
}

#[tokio::test]
async fn test_default_tier_applies_without_profile_tier() {
    let store = WatchlistStore::load(
        UserId::new("fresh"),
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(quotes_for(&TICKERS)),
        Tier::Pro,
    )
    .await
    .unwrap();

    assert_eq!(store.tier(), Tier::Pro);
    assert_eq!(store.tier().watchlist_limit(), Some(50));
}

#[tokio::test]
async fn test_repeated_add_is_idempotent() {
    let (store, _) = store_with_tier(Tier::Free).await;

    store.add("AAA").await.unwrap();
    let size = store.len();

    for raw in ["AAA", "aaa", " Aaa "] {
        assert_eq!(
            store.add(raw).await,
            Err(WatchlistError::AlreadyPresent(sym("AAA")))
        );
        assert_eq!(store.len(), size);
    }
}

#[tokio::test]
async fn test_concurrent_adds_of_same_symbol() {
    let (store, documents) = store_with_tier(Tier::Free).await;

    let (a, b) = tokio::join!(store.add("BBB"), store.add("bbb"));

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| *r == Err(WatchlistError::AlreadyPresent(sym("BBB")))));
    assert_eq!(store.symbols(), vec![sym("BBB")]);
    assert_eq!(documents.write_count(), 1);
}

#[tokio::test]
async fn test_invalid_inputs_never_reach_provider() {
    let quotes = Arc::new(quotes_for(&TICKERS));
    let store = WatchlistStore::new(
        UserId::new("u"),
        Tier::Free,
        Arc::new(MemoryDocumentStore::new()),
        quotes.clone(),
    );

    for raw in ["", "   ", "TOOLONG", "A1", "BRK.B", "$SPY"] {
        assert!(matches!(
            store.add(raw).await,
            Err(WatchlistError::ValidationFailed(ValidationError::Syntax(_)))
        ));
    }
    assert_eq!(quotes.calls(), 0);
}

#[tokio::test]
async fn test_add_then_remove_round_trip_through_store() {
    let documents = Arc::new(MemoryDocumentStore::demo());
    let user = UserId::new("mock-test-user");
    let store = WatchlistStore::load(
        user.clone(),
        documents.clone(),
        Arc::new(MockQuoteClient::demo()),
        Tier::Free,
    )
    .await
    .unwrap();

    store.add("nvda").await.unwrap();
    store.remove("GOOGL").await.unwrap();
    assert_eq!(
        store.remove("GOOGL").await,
        Err(WatchlistError::NotPresent("GOOGL".to_string()))
    );

    let reloaded = WatchlistStore::load(
        user,
        documents,
        Arc::new(MockQuoteClient::demo()),
        Tier::Free,
    )
    .await
    .unwrap();
    assert_eq!(
        reloaded.symbols(),
        vec![sym("AAPL"), sym("MSFT"), sym("NVDA")]
    );
}
