use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use taskpool_coordinator::{Coordinator, EventLog, PoolConfig};
use taskpool_worker::{FaultInjector, SimulatedLatency};

#[derive(Parser, Debug)]
#[command(name = "taskpool")]
#[command(about = "Bounded worker-pool task processor", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(long)]
    config: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Number of tasks to submit
    #[arg(short, long)]
    tasks: Option<usize>,

    /// Result output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fault the task with this label (repeatable)
    #[arg(long = "fail-task")]
    fail_tasks: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        PoolConfig::from_file(config_path)
            .with_context(|| format!("cannot load config {}", config_path))?
    } else {
        PoolConfig::default()
    };

    // Override with CLI args
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(tasks) = args.tasks {
        config.tasks = tasks;
    }
    if let Some(output) = args.output {
        config.output_file = output;
    }
    if let Some(log_file) = args.log_file {
        config.log_file = log_file;
    }
    config.fail_tasks.extend(args.fail_tasks);

    config.validate()?;

    // Everything below must open before the first worker starts
    let log = EventLog::open(&config.log_file, &config.log_level)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    let sink = tokio::fs::File::create(&config.output_file)
        .await
        .with_context(|| format!("cannot create output file {}", config.output_file.display()))?;

    let handler = FaultInjector::new(
        SimulatedLatency::new(config.latency_min_ms, config.latency_max_ms),
        config.fail_tasks.clone(),
    );

    tracing::dispatcher::with_default(&log.dispatch(), || {
        tracing::info!("Starting pool with config: {:?}", config);
    });

    let coordinator = Coordinator::new(config, Arc::new(handler), log.dispatch());
    let report = coordinator.run(sink).await?;

    println!(
        "{} tasks submitted, {} processed, {} faulted, {} results written to {}",
        report.submitted,
        report.processed,
        report.faulted,
        report.persisted,
        coordinator.config().output_file.display()
    );

    Ok(())
}
