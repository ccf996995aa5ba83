// Time-series querier interface
// The metrics store capability consumed by the aggregator. Implementations
// live under `transport`; the aggregator treats them as a black box.
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use crate::mapping::AggregateFunction;
use async_trait::async_trait;

/// Raw `(timestamp_ms, value)` points as returned by a backend, in any order
/// and possibly with duplicate timestamps.
pub type RawPoints = Vec<(i64, f64)>;

#[async_trait]
pub trait TimeSeriesQuerier: Send + Sync {
    /// Metric aggregated over the whole pipeline.
    async fn pipeline_metrics(
        &self,
        pipeline: &str,
        metric_name: &str,
        aggregate: AggregateFunction,
        from: i64,
        to: i64,
    ) -> Result<RawPoints, MetricsError>;

    /// Metric for a single component of a pipeline.
    async fn component_metrics(
        &self,
        pipeline: &str,
        component: &str,
        metric_name: &str,
        aggregate: AggregateFunction,
        from: i64,
        to: i64,
    ) -> Result<RawPoints, MetricsError>;
}
