//! CarePath CLI
//!
//! Answers caregiving questions from the command line. Each query becomes one
//! JSON response envelope on stdout; logs go to stderr.
//!
//! Queries come from positional arguments, or from stdin one per line.

use anyhow::Result;
use carepath_engine::DecisionEngine;
use carepath_telemetry::MetricsCollector;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};

mod config;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "carepath")]
#[command(about = "CarePath caregiving guidance engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Classifier confidence threshold override
    #[arg(short, long, env = "CAREPATH_THRESHOLD")]
    threshold: Option<f32>,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Session identifier attached to log lines (random if omitted)
    #[arg(short, long)]
    session: Option<String>,

    /// Pretty-print response envelopes
    #[arg(long)]
    pretty: bool,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long)]
    metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Queries to answer; reads stdin when empty
    queries: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config, &cli)?;
    init_tracing(cli.verbose, config.output.json_logs);
    install_panic_hook();

    info!("Starting CarePath");
    info!(
        "Confidence threshold: {}",
        config.engine.confidence_threshold
    );
    info!("Cache enabled: {}", config.engine.cache.enabled);

    let metrics_handle = init_metrics()?;

    let metrics = MetricsCollector::new();
    let engine = DecisionEngine::builder()
        .config(config.engine.clone())
        .metrics(metrics.clone())
        .load_sources()?
        .build()?;

    let session = cli
        .session
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.queries.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            answer(&engine, &line, &session, config.output.pretty, &mut out)?;
        }
    } else {
        for query in &cli.queries {
            answer(&engine, query, &session, config.output.pretty, &mut out)?;
        }
    }

    let snapshot = metrics.snapshot();
    info!(
        requests = snapshot.total_requests,
        crisis = snapshot.crisis,
        contextual = snapshot.contextual,
        classified = snapshot.classified,
        fallback = snapshot.fallback,
        cache_hit_rate = snapshot.cache_hit_rate(),
        avg_latency_us = snapshot.avg_latency_us(),
        "Session complete"
    );
    if snapshot.faults > 0 {
        warn!(faults = snapshot.faults, "Degraded pipeline steps during session");
    }

    if cli.metrics {
        eprintln!("{}", metrics_handle.render());
    }

    Ok(())
}

/// Answer one query and write its envelope as a JSON line
fn answer(
    engine: &DecisionEngine,
    text: &str,
    session: &str,
    pretty: bool,
    out: &mut impl Write,
) -> Result<()> {
    let envelope = engine.handle(text, Some(session));
    let json = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    writeln!(out, "{}", json)?;
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("carepath=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("carepath=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

/// Route panics through tracing instead of the default stderr hook
///
/// The engine recovers from panicking pipeline steps, so these are logged
/// events rather than crashes.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            panic = %panic_message(info.payload()),
            location = %location,
            "Panic caught"
        );
    }));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use carepath_telemetry::metrics::names;
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(names::REQUESTS_TOTAL, "Total number of queries handled");
    metrics::describe_counter!(
        names::DECISIONS_TOTAL,
        "Total number of responses by decision method"
    );
    metrics::describe_counter!(
        names::CACHE_LOOKUPS_TOTAL,
        "Response cache lookups by result"
    );
    metrics::describe_counter!(
        names::FAULTS_TOTAL,
        "Degraded pipeline steps by step name"
    );
    metrics::describe_histogram!(
        names::DECISION_LATENCY_US,
        metrics::Unit::Microseconds,
        "End-to-end decision latency in microseconds"
    );

    info!("Metrics recorder initialized");
    Ok(handle)
}
