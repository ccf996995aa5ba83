// Error types and error handling module
// This file defines the error kinds surfaced by the metrics aggregation core
//
// Numan Thabit 2025 Nov

use crate::mapping::MappedMetric;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    /// Wiring bug on the caller side, e.g. no time-series querier configured.
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error("invalid time range: from {from} must be before to {to}")]
    InvalidRange { from: i64, to: i64 },
    #[error("entity not deployed: pipeline {pipeline} has no runtime counterpart")]
    EntityNotDeployed { pipeline: String },
    /// `component` is the display name of the offending data source, when
    /// the record carries one.
    #[error("malformed configuration for pipeline {pipeline}{}: {reason}", source_label(.component))]
    ConfigMalformed {
        pipeline: String,
        component: Option<String>,
        reason: String,
    },
    #[error("metric not applicable: no Kafka topic configured for pipeline {pipeline} / source {component}")]
    ConfigMissing { pipeline: String, component: String },
    #[error("backend query error: {0}")]
    Query(String),
    #[error("report assembly missing series for {0}")]
    MissingSeries(MappedMetric),
    #[error("query task failed: {0}")]
    Task(String),
}

fn source_label(component: &Option<String>) -> String {
    component
        .as_deref()
        .map(|name| format!(" / source {name}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_malformed_names_source_when_known() {
        let named = MetricsError::ConfigMalformed {
            pipeline: "clicks".to_string(),
            component: Some("spout".to_string()),
            reason: "missing field `type`".to_string(),
        };
        assert_eq!(
            named.to_string(),
            "malformed configuration for pipeline clicks / source spout: missing field `type`"
        );

        let unnamed = MetricsError::ConfigMalformed {
            pipeline: "clicks".to_string(),
            component: None,
            reason: "expected a sequence".to_string(),
        };
        assert_eq!(
            unnamed.to_string(),
            "malformed configuration for pipeline clicks: expected a sequence"
        );
    }
}
