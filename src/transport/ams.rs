// Metrics collector transport
// Time-series querier backed by an Ambari-Metrics-style timeline collector.
// The runtime publishes one series per task, so each query matches a
// wildcard metric name and the per-task series are folded per timestamp
// with the requested aggregate function.
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use crate::mapping::AggregateFunction;
use crate::metrics::{REQ_ERRORS, REQ_LATENCY};
use crate::querier::{RawPoints, TimeSeriesQuerier};
use crate::transport::base_endpoint;
use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const TIMELINE_PATH: &str = "ws/v1/timeline/metrics";

#[derive(Clone)]
pub struct AmsQuerier {
    endpoint: Url,
    app_id: String,
    client: reqwest::Client,
    retry_max_elapsed: Duration,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    metrics: Vec<TimelineSeries>,
}

#[derive(Debug, Deserialize)]
struct TimelineSeries {
    #[serde(rename = "metricname", default)]
    metric_name: String,
    #[serde(default)]
    metrics: HashMap<String, f64>,
}

impl AmsQuerier {
    pub fn new(
        endpoint: Url,
        app_id: impl Into<String>,
        timeout: Duration,
        retry_max_elapsed: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .context("build HTTP client for metrics collector")?;

        Ok(Self {
            endpoint: base_endpoint(endpoint),
            app_id: app_id.into(),
            client,
            retry_max_elapsed,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn timeline_url(&self) -> Result<Url, MetricsError> {
        self.endpoint
            .join(TIMELINE_PATH)
            .map_err(|e| MetricsError::Query(format!("invalid collector endpoint: {e}")))
    }

    async fn query(
        &self,
        pattern: String,
        aggregate: AggregateFunction,
        from: i64,
        to: i64,
        method: &'static str,
    ) -> Result<RawPoints, MetricsError> {
        let _timer = REQ_LATENCY.with_label_values(&["ams", method]).start_timer();
        let url = self.timeline_url()?;

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
            max_elapsed_time: Some(self.retry_max_elapsed),
            multiplier: 2.0,
            ..Default::default()
        };

        let body = retry_notify(
            backoff,
            || {
                let url = url.clone();
                let pattern = pattern.clone();
                async move { self.fetch(url, &pattern, from, to).await }
            },
            |err: MetricsError, wait: Duration| {
                warn!(error = %err, retry_in_ms = wait.as_millis() as u64, "metrics collector query failed; retrying");
            },
        )
        .await
        .inspect_err(|_| {
            REQ_ERRORS.with_label_values(&["ams", method]).inc();
        })?;

        let points = fold_series(body, aggregate)?;
        debug!(pattern = %pattern, points = points.len(), "metrics collector query complete");
        Ok(points)
    }

    async fn fetch(
        &self,
        url: Url,
        pattern: &str,
        from: i64,
        to: i64,
    ) -> Result<TimelineResponse, backoff::Error<MetricsError>> {
        let start = from.to_string();
        let end = to.to_string();
        let response = self
            .client
            .get(url)
            .query(&[
                ("appId", self.app_id.as_str()),
                ("metricNames", pattern),
                ("startTime", start.as_str()),
                ("endTime", end.as_str()),
            ])
            .send()
            .await
            .map_err(|e| backoff::Error::transient(MetricsError::Query(format!("collector send: {e}"))))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(backoff::Error::transient(MetricsError::Query(format!(
                "collector http {status}"
            ))));
        }
        if !status.is_success() {
            return Err(backoff::Error::permanent(MetricsError::Query(format!(
                "collector http {status}"
            ))));
        }

        response
            .json::<TimelineResponse>()
            .await
            .map_err(|e| backoff::Error::permanent(MetricsError::Query(format!("collector json parse: {e}"))))
    }
}

#[async_trait]
impl TimeSeriesQuerier for AmsQuerier {
    async fn pipeline_metrics(
        &self,
        pipeline: &str,
        metric_name: &str,
        aggregate: AggregateFunction,
        from: i64,
        to: i64,
    ) -> Result<RawPoints, MetricsError> {
        let pattern = format!("topology.{pipeline}.%.--{metric_name}");
        self.query(pattern, aggregate, from, to, "pipeline_metrics").await
    }

    async fn component_metrics(
        &self,
        pipeline: &str,
        component: &str,
        metric_name: &str,
        aggregate: AggregateFunction,
        from: i64,
        to: i64,
    ) -> Result<RawPoints, MetricsError> {
        let pattern = format!("topology.{pipeline}.{component}.%.--{metric_name}");
        self.query(pattern, aggregate, from, to, "component_metrics").await
    }
}

/// Combine the per-task series of one response into a single point list.
fn fold_series(body: TimelineResponse, aggregate: AggregateFunction) -> Result<RawPoints, MetricsError> {
    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for series in body.metrics {
        for (ts, value) in series.metrics {
            let ts: i64 = ts.parse().map_err(|_| {
                MetricsError::Query(format!(
                    "collector returned non-numeric timestamp {ts:?} for {}",
                    series.metric_name
                ))
            })?;
            buckets.entry(ts).or_default().push(value);
        }
    }

    Ok(buckets
        .into_iter()
        .filter_map(|(ts, samples)| aggregate.fold(&samples).map(|v| (ts, v)))
        .collect())
}
