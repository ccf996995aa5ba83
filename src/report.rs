// Composite metric report
// Bundles the per-metric series fetched for one pipeline or component
//
// Numan Thabit 2025 Nov

use crate::errors::MetricsError;
use crate::mapping::MappedMetric;
use crate::timeseries::TimeSeries;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeMetricReport {
    #[serde(rename = "componentName")]
    pub entity_name: String,
    pub input_records: TimeSeries,
    pub output_records: TimeSeries,
    pub failed_records: TimeSeries,
    pub processed_time: TimeSeries,
    pub records_in_wait_queue: TimeSeries,
    /// Auxiliary series; always carries `ackedRecords` for older consumers.
    pub misc: BTreeMap<String, TimeSeries>,
}

impl CompositeMetricReport {
    /// Series for a stats metric, looking in `misc` for acked records.
    pub fn series(&self, metric: MappedMetric) -> Option<&TimeSeries> {
        match metric {
            MappedMetric::InputRecords => Some(&self.input_records),
            MappedMetric::OutputRecords => Some(&self.output_records),
            MappedMetric::FailedRecords => Some(&self.failed_records),
            MappedMetric::ProcessedTime => Some(&self.processed_time),
            MappedMetric::RecordsInWaitQueue => Some(&self.records_in_wait_queue),
            other => self.misc.get(other.as_str()),
        }
    }
}

pub fn build_report(
    entity_name: impl Into<String>,
    mut stats: HashMap<MappedMetric, TimeSeries>,
) -> Result<CompositeMetricReport, MetricsError> {
    let mut take = |metric: MappedMetric| stats.remove(&metric).ok_or(MetricsError::MissingSeries(metric));

    let input_records = take(MappedMetric::InputRecords)?;
    let output_records = take(MappedMetric::OutputRecords)?;
    let acked_records = take(MappedMetric::AckedRecords)?;
    let failed_records = take(MappedMetric::FailedRecords)?;
    let processed_time = take(MappedMetric::ProcessedTime)?;
    let records_in_wait_queue = take(MappedMetric::RecordsInWaitQueue)?;

    let mut misc = BTreeMap::new();
    misc.insert(MappedMetric::AckedRecords.as_str().to_string(), acked_records);

    Ok(CompositeMetricReport {
        entity_name: entity_name.into(),
        input_records,
        output_records,
        failed_records,
        processed_time,
        records_in_wait_queue,
        misc,
    })
}
