//! jmxpoller - Host-resident JVM telemetry agent
//!
//! Spawns one collection task per configured target and shuts every live
//! connection down cleanly on SIGINT.

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use jmxpoller::cli::Cli;
use jmxpoller::collector::JmxCollector;
use jmxpoller::config::Config;
use jmxpoller::metric::MetricSink;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    jmxpoller::init_logging(&args.log_level.to_string())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting jmxpoller");

    let config = Config::load(&args.config)?;

    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    if config.output.write_output_files {
        std::fs::create_dir_all(&config.output.output_directory)?;
    }

    let sink = MetricSink::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut workers = JoinSet::new();
    for target in &config.targets {
        let collector = JmxCollector::new(&config, target, sink.clone());
        workers.spawn(collector.run(shutdown_rx.clone()));
    }
    drop(shutdown_rx);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping collectors");

    if shutdown_tx.send(true).is_err() {
        warn!("All collectors already stopped");
    }

    while workers.join_next().await.is_some() {}

    info!("All collectors stopped");
    Ok(())
}
