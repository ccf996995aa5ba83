use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use metrics_aggr::config::AppConfig;
use metrics_aggr::control::AdmissionControl;
use metrics_aggr::topology::{Component, PipelineLayout};
use metrics_aggr::transport::{AmsQuerier, RuntimeRestResolver};
use metrics_aggr::TopologyMetrics;
use prometheus::{Encoder, TextEncoder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "metrics-aggr")]
#[command(version)]
#[command(about = "Query time-series metrics of deployed stream pipelines")]
struct Cli {
    /// Pipeline layout document (JSON or YAML)
    #[arg(short, long, env = "METRICS_AGGR_LAYOUT")]
    layout: PathBuf,

    /// Range start, epoch milliseconds
    #[arg(long)]
    from: i64,

    /// Range end, epoch milliseconds
    #[arg(long)]
    to: i64,

    /// Print self-instrumentation in Prometheus text format to stderr
    #[arg(long)]
    dump_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stats for the whole pipeline
    PipelineStats,
    /// Stats for one component
    ComponentStats(ComponentArgs),
    /// Complete latency of one component
    CompleteLatency(ComponentArgs),
    /// Log size, offset and lag of the Kafka topic read by a source
    KafkaOffsets(ComponentArgs),
}

#[derive(Args, Debug)]
struct ComponentArgs {
    #[arg(long)]
    component_id: String,
    #[arg(long)]
    component_name: String,
}

impl From<&ComponentArgs> for Component {
    fn from(args: &ComponentArgs) -> Self {
        Component::new(args.component_id.clone(), args.component_name.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    let cli = Cli::parse();
    if let Err(err) = run(&cli).await {
        tracing::error!(error = ?err, "metrics query failed");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;
    let layout = PipelineLayout::load(&cli.layout)?;

    let querier = AmsQuerier::new(
        config.querier_endpoint.clone(),
        config.app_id(),
        config.query_timeout(),
        config.retry_max_elapsed(),
    )
    .context("initialize metrics collector querier")?;
    let resolver = RuntimeRestResolver::new(
        config.runtime_endpoint.clone(),
        config.topology_prefix(),
        config.query_timeout(),
    )
    .context("initialize runtime name resolver")?;

    info!(
        collector = %querier.endpoint(),
        runtime = %resolver.endpoint(),
        pipeline = %layout.name,
        max_inflight = config.max_inflight,
        "metrics aggregator ready"
    );

    let admission = AdmissionControl::new(config.max_inflight, config.queries_per_sec);
    let metrics = TopologyMetrics::new(Arc::new(resolver), admission).with_querier(Arc::new(querier));

    let output = match &cli.command {
        Commands::PipelineStats => {
            serde_json::to_value(metrics.pipeline_stats(&layout, cli.from, cli.to).await?)?
        }
        Commands::ComponentStats(args) => serde_json::to_value(
            metrics
                .component_stats(&layout, &args.into(), cli.from, cli.to)
                .await?,
        )?,
        Commands::CompleteLatency(args) => serde_json::to_value(
            metrics
                .complete_latency(&layout, &args.into(), cli.from, cli.to)
                .await?,
        )?,
        Commands::KafkaOffsets(args) => serde_json::to_value(
            metrics
                .kafka_topic_offsets(&layout, &args.into(), cli.from, cli.to)
                .await?,
        )?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    if cli.dump_metrics {
        dump_metrics()?;
    }
    Ok(())
}

fn dump_metrics() -> Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .context("encode prometheus metrics")?;
    eprintln!("{}", String::from_utf8_lossy(&buffer));
    Ok(())
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
