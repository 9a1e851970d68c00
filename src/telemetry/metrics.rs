//! Prometheus metrics

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One fan-out over a watchlist
    BatchFetch,
    /// One scheduler cycle, fetch through publish
    RefreshCycle,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Symbols on a user's watchlist, labelled by `user_id`
    WatchlistSize,
    /// Failed symbols in a subscription's last cycle, labelled by `subscription_id`
    CycleFailures,
}

impl GaugeMetric {
    fn name(&self) -> &'static str {
        match self {
            GaugeMetric::WatchlistSize => "quanta_watchlist_size",
            GaugeMetric::CycleFailures => "quanta_fetch_cycle_failures",
        }
    }

    fn scope_label(&self) -> &'static str {
        match self {
            GaugeMetric::WatchlistSize => "user_id",
            GaugeMetric::CycleFailures => "subscription_id",
        }
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::BatchFetch => "quanta_batch_fetch_duration_ms",
        LatencyMetric::RefreshCycle => "quanta_fetch_cycle_duration_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value for one user or subscription
pub fn set_gauge(metric: GaugeMetric, scope: &str, value: f64) {
    metrics::gauge!(metric.name(), metric.scope_label() => scope.to_string()).set(value);
}

/// Count one provider request by outcome (`success` or an error kind)
pub fn record_quote_result(outcome: &'static str) {
    metrics::counter!("quanta_quote_requests_total", "outcome" => outcome).increment(1);
}

/// Count one watchlist mutation by operation and result
pub fn record_mutation(op: &'static str, result: &'static str) {
    metrics::counter!(
        "quanta_watchlist_mutations_total",
        "op" => op,
        "result" => result
    )
    .increment(1);
}
