// Metrics and observability module
// Self-instrumentation for upstream calls and aggregation requests
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

pub static REQ_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "metrics_aggr_upstream_latency_seconds",
        "latency for upstream calls",
        &["service", "method"]
    )
    .unwrap()
});

pub static REQ_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "metrics_aggr_upstream_errors_total",
        "errors by upstream",
        &["service", "method"]
    )
    .unwrap()
});

pub static METRIC_QUERIES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "metrics_aggr_metric_queries_total",
        "backend metric queries issued by the aggregator",
        &["granularity", "metric"]
    )
    .unwrap()
});
