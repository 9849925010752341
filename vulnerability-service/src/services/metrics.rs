//! Prometheus metrics for vulnerability-service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

/// Handle of the `metrics` facade recorder (HTTP request metrics).
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Search requests by outcome (`ok`, `invalid_filter`, `invalid_pagination`, ...).
pub static SEARCH_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vulnerability_search_requests_total",
        "Total number of vulnerability searches",
        &["outcome"]
    )
    .expect("Failed to register search_requests_total")
});

/// Single-record lookups by outcome (`found`, `not_found`, `storage_error`).
pub static LOOKUPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vulnerability_lookups_total",
        "Total number of single vulnerability lookups",
        &["outcome"]
    )
    .expect("Failed to register lookups_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "vulnerability_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    Lazy::force(&SEARCH_REQUESTS_TOTAL);
    Lazy::force(&LOOKUPS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);

    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!(error = %e, "Metrics recorder not installed"),
        }
    }
}

pub fn record_search(outcome: &str) {
    SEARCH_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_lookup(outcome: &str) {
    LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    output.push_str(&encoder.encode_to_string(&metric_families).unwrap_or_default());

    output
}
