// Configuration management module
// This file handles loading and parsing of configuration settings
// from environment variables
//
// Numan Thabit 2025 Nov

use anyhow::{ensure, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_TOPOLOGY_PREFIX: &str = "streamline-";
const DEFAULT_APP_ID: &str = "nimbus";
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_MAX_ELAPSED_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Metrics collector base URL, e.g. http://ams-collector:6188/
    pub querier_endpoint: Url,
    /// Stream runtime REST base URL, e.g. http://storm-ui:8744/
    pub runtime_endpoint: Url,
    /// Prefix the deployer puts in front of runtime pipeline names
    pub topology_prefix: Option<String>,
    /// Application id the runtime reports metrics under
    pub app_id: Option<String>,
    /// Concurrency control for backend queries
    pub max_inflight: usize,
    /// Optional pacing of backend query starts, per second
    pub queries_per_sec: Option<u32>,
    /// Per HTTP request timeout
    pub query_timeout_ms: Option<u64>,
    /// Give up retrying a failing collector query after this long
    pub retry_max_elapsed_ms: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        let app: Self = cfg.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.max_inflight > 0, "max_inflight must be positive");
        ensure!(
            self.query_timeout_ms.map_or(true, |ms| ms > 0),
            "query_timeout_ms must be positive"
        );
        ensure!(
            self.queries_per_sec.map_or(true, |rate| rate > 0),
            "queries_per_sec must be positive when set"
        );
        Ok(())
    }

    pub fn topology_prefix(&self) -> &str {
        self.topology_prefix
            .as_deref()
            .unwrap_or(DEFAULT_TOPOLOGY_PREFIX)
    }

    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or(DEFAULT_APP_ID)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.unwrap_or(DEFAULT_QUERY_TIMEOUT_MS))
    }

    pub fn retry_max_elapsed(&self) -> Duration {
        Duration::from_millis(
            self.retry_max_elapsed_ms
                .unwrap_or(DEFAULT_RETRY_MAX_ELAPSED_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(overrides: &[(&str, &str)]) -> Result<AppConfig> {
        let mut builder = config::Config::builder()
            .set_default("querier_endpoint", "http://collector:6188/")?
            .set_default("runtime_endpoint", "http://runtime:8744/")?
            .set_default("max_inflight", 8)?;
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        let app: AppConfig = builder.build()?.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    #[test]
    fn test_defaults() {
        let app = parse(&[]).unwrap();
        assert_eq!(app.topology_prefix(), "streamline-");
        assert_eq!(app.app_id(), "nimbus");
        assert_eq!(app.query_timeout(), Duration::from_secs(30));
        assert_eq!(app.retry_max_elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let app = parse(&[("topology_prefix", "iotas-"), ("query_timeout_ms", "500")]).unwrap();
        assert_eq!(app.topology_prefix(), "iotas-");
        assert_eq!(app.query_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_inflight_rejected() {
        assert!(parse(&[("max_inflight", "0")]).is_err());
    }

    #[test]
    fn test_zero_query_rate_rejected() {
        let err = parse(&[("queries_per_sec", "0")]).unwrap_err();
        assert!(err.to_string().contains("queries_per_sec"));
        assert_eq!(parse(&[("queries_per_sec", "50")]).unwrap().queries_per_sec, Some(50));
    }
}
