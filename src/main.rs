//! Backup Engine - Main entry point
//!
//! Unattended MySQL backup service: periodic discovery, per-table CSV
//! exports, full SQL dumps, cycle manifests and retention cleanup.

use anyhow::Result;
use backup_engine::config::EngineConfig;
use backup_engine::db::mysql::MySqlCatalog;
use backup_engine::services::labels::DockerCliLabelProvider;
use backup_engine::services::scheduler::BackupEngine;
use backup_engine::services::sql_dump::MysqldumpTool;
use backup_engine::utils;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run a single backup cycle and exit
    #[arg(long)]
    once: bool,

    /// Output directory for artifacts (overrides BACKUP_DIR)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Misconfiguration here is the single fatal condition.
    let mut config = EngineConfig::from_env()?;
    if let Some(dir) = args.output_dir {
        config.backup_dir = dir;
    }

    std::fs::create_dir_all(&config.backup_dir)?;

    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    utils::logger::init(log_level, &config.backup_dir)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.db_host,
        port = config.db_port,
        backup_dir = %config.backup_dir.display(),
        interval_hours = config.interval_hours,
        format = %config.format,
        retention_days = config.retention_days,
        "Starting backup engine"
    );

    let catalog = Arc::new(MySqlCatalog::connect(&config));
    let dump_tool = Arc::new(MysqldumpTool::new(&config));
    let labels = Arc::new(DockerCliLabelProvider);

    let mut engine = BackupEngine::new(config, catalog, dump_tool, labels);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_cancel).await;
    });

    if args.once {
        let report = engine.run_once(cancel).await?;
        tracing::info!(
            stamp = %report.stamp.token,
            artifacts = report.artifacts.len(),
            failures = report.failures,
            swept = report.swept,
            "Single cycle complete"
        );
        return Ok(());
    }

    engine.run(cancel).await;
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    cancel.cancel();
}
