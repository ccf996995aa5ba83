// Library root module for metrics-aggr
// This file defines the public API and module structure for the metrics-aggr library
// It exports the aggregation core used by the command line driver
//
// Numan Thabit 2025 Nov

pub mod aggregator;
pub mod config;
pub mod control;
pub mod errors;
pub mod mapping;
pub mod metrics;
pub mod querier;
pub mod report;
pub mod resolver;
pub mod timeseries;
pub mod topic;
pub mod topology;
pub mod transport;

pub use aggregator::TopologyMetrics;
pub use errors::MetricsError;
pub use report::CompositeMetricReport;
pub use timeseries::TimeSeries;
