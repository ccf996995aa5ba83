// Metric name mapping module
// This file maps abstract metric identifiers onto the metric names the
// stream runtime reports to the metrics store, plus their aggregate functions
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use std::fmt;
use std::str::FromStr;

const TOPIC_PLACEHOLDER: &str = "{topic}";

/// How raw samples are combined per time bucket by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// Fold a non-empty slice of samples. Returns `None` for an empty slice.
    pub fn fold(&self, samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let value = match self {
            AggregateFunction::Sum => samples.iter().sum(),
            AggregateFunction::Avg => samples.iter().sum::<f64>() / samples.len() as f64,
            AggregateFunction::Min => samples.iter().copied().fold(f64::INFINITY, f64::min),
            AggregateFunction::Max => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        Some(value)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract metric identifiers understood by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MappedMetric {
    CompleteLatency,
    InputRecords,
    OutputRecords,
    AckedRecords,
    FailedRecords,
    ProcessedTime,
    RecordsInWaitQueue,
    Logsize,
    Offset,
    Lag,
}

/// Metrics fanned out for pipeline and component stats.
pub const STATS_METRICS: [MappedMetric; 6] = [
    MappedMetric::InputRecords,
    MappedMetric::OutputRecords,
    MappedMetric::AckedRecords,
    MappedMetric::FailedRecords,
    MappedMetric::ProcessedTime,
    MappedMetric::RecordsInWaitQueue,
];

/// Topic-parameterized metrics queried for Kafka sources.
pub const KAFKA_OFFSET_METRICS: [MappedMetric; 3] =
    [MappedMetric::Logsize, MappedMetric::Offset, MappedMetric::Lag];

impl MappedMetric {
    pub const ALL: [MappedMetric; 10] = [
        MappedMetric::CompleteLatency,
        MappedMetric::InputRecords,
        MappedMetric::OutputRecords,
        MappedMetric::AckedRecords,
        MappedMetric::FailedRecords,
        MappedMetric::ProcessedTime,
        MappedMetric::RecordsInWaitQueue,
        MappedMetric::Logsize,
        MappedMetric::Offset,
        MappedMetric::Lag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MappedMetric::CompleteLatency => "completeLatency",
            MappedMetric::InputRecords => "inputRecords",
            MappedMetric::OutputRecords => "outputRecords",
            MappedMetric::AckedRecords => "ackedRecords",
            MappedMetric::FailedRecords => "failedRecords",
            MappedMetric::ProcessedTime => "processedTime",
            MappedMetric::RecordsInWaitQueue => "recordsInWaitQueue",
            MappedMetric::Logsize => "logsize",
            MappedMetric::Offset => "offset",
            MappedMetric::Lag => "lag",
        }
    }
}

impl fmt::Display for MappedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappedMetric {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MappedMetric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| MetricsError::Precondition(format!("unknown metric identifier: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricMapping {
    pub metric: MappedMetric,
    pub template: &'static str,
    pub aggregate: AggregateFunction,
}

impl MetricMapping {
    pub fn is_parameterized(&self) -> bool {
        self.template.contains(TOPIC_PLACEHOLDER)
    }

    /// Render the backend metric name, substituting the topic into
    /// parameterized templates.
    pub fn backend_name(&self, topic: Option<&str>) -> Result<String, MetricsError> {
        match (self.is_parameterized(), topic) {
            (true, Some(topic)) => Ok(self.template.replacen(TOPIC_PLACEHOLDER, topic, 1)),
            (false, None) => Ok(self.template.to_string()),
            (true, None) => Err(MetricsError::Precondition(format!(
                "metric {} requires a topic name",
                self.metric
            ))),
            (false, Some(_)) => Err(MetricsError::Precondition(format!(
                "metric {} does not take a topic name",
                self.metric
            ))),
        }
    }
}

/// Look up the backend mapping for a metric identifier.
pub fn resolve(metric: MappedMetric) -> MetricMapping {
    use AggregateFunction::{Avg, Sum};

    let (template, aggregate) = match metric {
        MappedMetric::CompleteLatency => ("__complete-latency", Avg),
        MappedMetric::InputRecords => ("__execute-count", Sum),
        MappedMetric::OutputRecords => ("__emit-count", Sum),
        MappedMetric::AckedRecords => ("__ack-count", Sum),
        MappedMetric::FailedRecords => ("__fail-count", Sum),
        MappedMetric::ProcessedTime => ("__process-latency", Avg),
        MappedMetric::RecordsInWaitQueue => ("__receive.population", Avg),
        MappedMetric::Logsize => ("kafkaOffset.{topic}/totalLogSize", Sum),
        MappedMetric::Offset => ("kafkaOffset.{topic}/totalLatestCompletedOffset", Sum),
        MappedMetric::Lag => ("kafkaOffset.{topic}/totalSpoutLag", Sum),
    };

    MetricMapping {
        metric,
        template,
        aggregate,
    }
}
