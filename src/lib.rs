//! quanta-watch: watchlist quote synchronization for the Quanta dashboard
//!
//! This library provides the core components for:
//! - Ticker symbol validation
//! - Quote retrieval from Finnhub (or an in-memory mock)
//! - Concurrent, collect-all batch fetching
//! - Per-user watchlists persisted to a profile document store
//! - Interval-driven refresh subscriptions with clean cancellation
//! - Session-driven dashboard wiring
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod quote;
pub mod refresh;
pub mod session;
pub mod store;
pub mod symbol;
pub mod telemetry;
pub mod watchlist;
