//! Logging configuration using tracing.
//!
//! Events go to stdout and to an append-only `backup.log` next to the
//! artifacts, so cycle outcomes stay inspectable alongside the files
//! they describe. The log file itself falls under the retention sweep.

use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the specified level, mirroring to
/// `<log_dir>/backup.log`.
pub fn init(level: &str, log_dir: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("backup.log"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    Ok(())
}
