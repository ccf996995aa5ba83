// Pipeline metrics aggregator
// Translates pipeline / component metric requests into backend queries,
// fans them out concurrently and assembles the results
//
// Numan Thabit 2025 Nov

use crate::control::AdmissionControl;
use crate::errors::MetricsError;
use crate::mapping::{resolve, MappedMetric, KAFKA_OFFSET_METRICS, STATS_METRICS};
use crate::metrics::METRIC_QUERIES;
use crate::querier::TimeSeriesQuerier;
use crate::report::{build_report, CompositeMetricReport};
use crate::resolver::{component_backend_name, EntityNameResolver};
use crate::timeseries::TimeSeries;
use crate::topic::TopicError;
use crate::topology::{Component, PipelineLayout};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Where a query is aimed on the runtime side.
#[derive(Debug)]
enum Scope {
    Pipeline { pipeline: String },
    Component { pipeline: String, component: String },
}

impl Scope {
    fn granularity(&self) -> &'static str {
        match self {
            Scope::Pipeline { .. } => "pipeline",
            Scope::Component { .. } => "component",
        }
    }
}

/// Everything a single backend query task needs; cheap to clone into tasks.
#[derive(Clone)]
struct QueryContext {
    querier: Arc<dyn TimeSeriesQuerier>,
    admission: AdmissionControl,
    scope: Arc<Scope>,
    from: i64,
    to: i64,
}

impl QueryContext {
    async fn fetch(
        &self,
        metric: MappedMetric,
        topic: Option<&str>,
    ) -> Result<(MappedMetric, TimeSeries), MetricsError> {
        let mapping = resolve(metric);
        let backend_name = mapping.backend_name(topic)?;

        let _permit = self.admission.acquire().await?;
        METRIC_QUERIES
            .with_label_values(&[self.scope.granularity(), metric.as_str()])
            .inc();
        debug!(
            metric = %metric,
            backend_name = %backend_name,
            aggregate = %mapping.aggregate,
            scope = ?self.scope,
            "querying backend metric"
        );

        let points = match self.scope.as_ref() {
            Scope::Pipeline { pipeline } => {
                self.querier
                    .pipeline_metrics(pipeline, &backend_name, mapping.aggregate, self.from, self.to)
                    .await?
            }
            Scope::Component {
                pipeline,
                component,
            } => {
                self.querier
                    .component_metrics(
                        pipeline,
                        component,
                        &backend_name,
                        mapping.aggregate,
                        self.from,
                        self.to,
                    )
                    .await?
            }
        };

        Ok((metric, TimeSeries::from_points(points)))
    }

    /// Spawn one task per metric and wait for all of them. The first failure
    /// fails the whole call; tasks still running are left to finish.
    async fn fan_out(
        &self,
        metrics: &[MappedMetric],
        topic: Option<&str>,
    ) -> Result<HashMap<MappedMetric, TimeSeries>, MetricsError> {
        let topic: Option<Arc<str>> = topic.map(Arc::from);
        let handles = metrics.iter().map(|&metric| {
            let ctx = self.clone();
            let topic = topic.clone();
            let handle = tokio::spawn(async move { ctx.fetch(metric, topic.as_deref()).await });
            async move { handle.await.map_err(|e| MetricsError::Task(e.to_string()))? }
        });

        Ok(try_join_all(handles).await?.into_iter().collect())
    }
}

/// Time-series metrics for deployed pipelines.
pub struct TopologyMetrics {
    resolver: Arc<dyn EntityNameResolver>,
    querier: RwLock<Option<Arc<dyn TimeSeriesQuerier>>>,
    admission: AdmissionControl,
}

impl TopologyMetrics {
    pub fn new(resolver: Arc<dyn EntityNameResolver>, admission: AdmissionControl) -> Self {
        Self {
            resolver,
            querier: RwLock::new(None),
            admission,
        }
    }

    pub fn with_querier(mut self, querier: Arc<dyn TimeSeriesQuerier>) -> Self {
        *self.querier.get_mut() = Some(querier);
        self
    }

    pub async fn set_querier(&self, querier: Arc<dyn TimeSeriesQuerier>) {
        *self.querier.write().await = Some(querier);
    }

    pub async fn querier(&self) -> Result<Arc<dyn TimeSeriesQuerier>, MetricsError> {
        self.querier
            .read()
            .await
            .clone()
            .ok_or_else(|| MetricsError::Precondition("time series querier is not set".to_string()))
    }

    /// Precondition checks shared by every entry point.
    async fn prepare(&self, from: i64, to: i64) -> Result<Arc<dyn TimeSeriesQuerier>, MetricsError> {
        let querier = self.querier().await?;
        if from >= to {
            return Err(MetricsError::InvalidRange { from, to });
        }
        Ok(querier)
    }

    fn context(&self, querier: Arc<dyn TimeSeriesQuerier>, scope: Scope, from: i64, to: i64) -> QueryContext {
        QueryContext {
            querier,
            admission: self.admission.clone(),
            scope: Arc::new(scope),
            from,
            to,
        }
    }

    async fn runtime_name(&self, layout: &PipelineLayout) -> Result<String, MetricsError> {
        self.resolver
            .resolve_backend_name(layout.id, &layout.name)
            .await
    }

    async fn component_scope(
        &self,
        layout: &PipelineLayout,
        component: &Component,
    ) -> Result<Scope, MetricsError> {
        Ok(Scope::Component {
            pipeline: self.runtime_name(layout).await?,
            component: component_backend_name(component),
        })
    }

    #[tracing::instrument(skip_all, fields(pipeline = %layout.name, from = from, to = to))]
    pub async fn pipeline_stats(
        &self,
        layout: &PipelineLayout,
        from: i64,
        to: i64,
    ) -> Result<CompositeMetricReport, MetricsError> {
        let querier = self.prepare(from, to).await?;
        let scope = Scope::Pipeline {
            pipeline: self.runtime_name(layout).await?,
        };

        let stats = self
            .context(querier, scope, from, to)
            .fan_out(&STATS_METRICS, None)
            .await?;
        let report = build_report(layout.name.clone(), stats)?;
        info!(series = STATS_METRICS.len(), "pipeline stats assembled");
        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(pipeline = %layout.name, component = %component.name, from = from, to = to))]
    pub async fn component_stats(
        &self,
        layout: &PipelineLayout,
        component: &Component,
        from: i64,
        to: i64,
    ) -> Result<CompositeMetricReport, MetricsError> {
        let querier = self.prepare(from, to).await?;
        let scope = self.component_scope(layout, component).await?;

        let stats = self
            .context(querier, scope, from, to)
            .fan_out(&STATS_METRICS, None)
            .await?;
        let report = build_report(component.name.clone(), stats)?;
        info!(series = STATS_METRICS.len(), "component stats assembled");
        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(pipeline = %layout.name, component = %component.name, from = from, to = to))]
    pub async fn complete_latency(
        &self,
        layout: &PipelineLayout,
        component: &Component,
        from: i64,
        to: i64,
    ) -> Result<TimeSeries, MetricsError> {
        let querier = self.prepare(from, to).await?;
        let scope = self.component_scope(layout, component).await?;

        let (_, series) = self
            .context(querier, scope, from, to)
            .fetch(MappedMetric::CompleteLatency, None)
            .await?;
        Ok(series)
    }

    /// Log size, committed offset and lag of the Kafka topic read by a
    /// source component, keyed by metric identifier.
    #[tracing::instrument(skip_all, fields(pipeline = %layout.name, component = %component.name, from = from, to = to))]
    pub async fn kafka_topic_offsets(
        &self,
        layout: &PipelineLayout,
        component: &Component,
        from: i64,
        to: i64,
    ) -> Result<BTreeMap<String, TimeSeries>, MetricsError> {
        let querier = self.prepare(from, to).await?;

        let topic = layout
            .config
            .find_topic(&component.name)
            .map_err(|e: TopicError| MetricsError::ConfigMalformed {
                pipeline: layout.name.clone(),
                component: Some(component.name.clone()),
                reason: e.to_string(),
            })?
            .ok_or_else(|| MetricsError::ConfigMissing {
                pipeline: layout.name.clone(),
                component: component.name.clone(),
            })?;
        debug!(topic = %topic, "resolved kafka topic");

        let scope = self.component_scope(layout, component).await?;
        let offsets = self
            .context(querier, scope, from, to)
            .fan_out(&KAFKA_OFFSET_METRICS, Some(topic.as_str()))
            .await?;

        Ok(offsets
            .into_iter()
            .map(|(metric, series)| (metric.as_str().to_string(), series))
            .collect())
    }
}
