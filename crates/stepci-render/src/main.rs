//! stepci-render: compile a Task document into its workload unit.
//!
//! Commands of steps without an explicit command are resolved from their registry.
//! The unit is created against an in-memory control plane and printed as JSON on stdout.

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use stepci_core::{BuildContext, ControlPlane, MemoryControlPlane, TaskBuilder};
use stepci_image::{ImageCommandCache, RegistryResolver};
use stepci_model::Task;
use stepci_observe::{LoggerLevel, LoggerTimeZone, init_local_offset, init_logger};
use stepci_prometheus::PrometheusMetrics;

mod config;
use config::RenderConfig;

/// Compile a Task into the workload unit that runs its steps in order
#[derive(Parser)]
#[command(name = "stepci-render", version, long_about = None)]
struct Cli {
    /// Task document (JSON)
    task: PathBuf,

    /// Configuration file (JSON) with `logger`, `compiler` and `registry` sections
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the log filter, e.g. `stepci_core=debug,info`
    #[arg(long)]
    log_level: Option<String>,

    /// Print the collected metrics to stderr after the build
    #[arg(long)]
    metrics: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = RenderConfig::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        cfg.logger.level = LoggerLevel::new(level.as_str())?;
    }

    // 1) logger, before any thread exists
    if cfg.logger.tz == LoggerTimeZone::Local {
        init_local_offset();
    }
    init_logger(&cfg.logger)?;

    // 2) runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    runtime.block_on(run(cli, cfg))
}

async fn run(cli: Cli, cfg: RenderConfig) -> anyhow::Result<()> {
    cfg.compiler.validate()?;

    let raw = fs::read_to_string(&cli.task)
        .with_context(|| format!("reading task {}", cli.task.display()))?;
    let mut task: Task = serde_json::from_str(&raw)
        .with_context(|| format!("parsing task {}", cli.task.display()))?;
    if task.metadata.uid.is_none() {
        let uid = Uuid::new_v4();
        warn!(task = %task.metadata.key(), %uid, "task has no uid, using a random one");
        task.metadata.uid = Some(uid);
    }

    // 3) build stack
    let metrics = PrometheusMetrics::new()?;
    let ctx = BuildContext::new(cfg.compiler.clone(), Arc::new(metrics.clone()));
    let resolver = RegistryResolver::new(cfg.compiler.platform.clone(), cfg.registry.clone())?;
    let cache = ImageCommandCache::new(cfg.compiler.cache_capacity)?;
    let plane = Arc::new(MemoryControlPlane::new());
    let builder = TaskBuilder::new(plane.clone(), Arc::new(resolver), Arc::new(cache), ctx);

    // 4) ctrl-c aborts pending registry requests
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    // 5) build and print
    let outcome = builder.build(&task, &cancel).await?;
    info!(task = %task.metadata.key(), %outcome, "build finished");

    let name = builder.compiler().unit_name(&task);
    let unit = plane.get(&task.metadata.namespace, &name).await?;
    println!("{}", serde_json::to_string_pretty(&unit)?);

    if cli.metrics {
        eprint!("{}", metrics.encode()?);
    }
    Ok(())
}
