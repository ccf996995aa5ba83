// Stream runtime REST transport
// Resolves deployed pipeline names through the runtime's topology summary API
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use crate::metrics::{REQ_ERRORS, REQ_LATENCY};
use crate::resolver::EntityNameResolver;
use crate::transport::base_endpoint;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const SUMMARY_PATH: &str = "api/v1/topology/summary";

#[derive(Debug, Clone)]
pub struct RuntimeRestResolver {
    http: Client,
    endpoint: Url,
    prefix: String,
}

#[derive(Debug, Deserialize)]
struct TopologySummary {
    #[serde(default)]
    topologies: Vec<TopologyEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct TopologyEntry {
    name: String,
}

impl RuntimeRestResolver {
    pub fn new(endpoint: Url, prefix: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client for stream runtime")?;
        Ok(Self {
            http,
            endpoint: base_endpoint(endpoint),
            prefix: prefix.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn summary(&self) -> Result<TopologySummary, MetricsError> {
        let _timer = REQ_LATENCY
            .with_label_values(&["runtime", "topology_summary"])
            .start_timer();

        let result = self.fetch_summary().await;
        if result.is_err() {
            REQ_ERRORS
                .with_label_values(&["runtime", "topology_summary"])
                .inc();
        }
        result
    }

    async fn fetch_summary(&self) -> Result<TopologySummary, MetricsError> {
        let url = self
            .endpoint
            .join(SUMMARY_PATH)
            .map_err(|e| MetricsError::Query(format!("invalid runtime endpoint: {e}")))?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MetricsError::Query(format!("runtime send: {e}")))?;
        if !resp.status().is_success() {
            return Err(MetricsError::Query(format!("runtime http {}", resp.status())));
        }
        resp.json::<TopologySummary>()
            .await
            .map_err(|e| MetricsError::Query(format!("runtime json parse: {e}")))
    }
}

/// First deployed name carrying the `{prefix}{pipeline_id}-` marker.
fn find_deployed(summary: &TopologySummary, prefix: &str, pipeline_id: u64) -> Option<String> {
    let marker = format!("{prefix}{pipeline_id}-");
    summary
        .topologies
        .iter()
        .find(|t| t.name.starts_with(&marker))
        .map(|t| t.name.clone())
}

#[async_trait]
impl EntityNameResolver for RuntimeRestResolver {
    async fn resolve_backend_name(
        &self,
        pipeline_id: u64,
        pipeline_name: &str,
    ) -> Result<String, MetricsError> {
        let summary = self.summary().await?;
        let name = find_deployed(&summary, &self.prefix, pipeline_id).ok_or_else(|| {
            MetricsError::EntityNotDeployed {
                pipeline: pipeline_name.to_string(),
            }
        })?;
        debug!(pipeline_id = pipeline_id, runtime_name = %name, "resolved runtime pipeline name");
        Ok(name)
    }
}
