//! Error taxonomy for the backup engine.
//!
//! Every category is recoverable at cycle scope: connection problems are
//! retried with backoff, discovery aborts a single cycle, export/dump
//! failures are isolated per entity, manifest and sweep failures are
//! logged and skipped. Nothing here terminates the process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Dump error: {0}")]
    Dump(String),

    #[error("Manifest write error: {0}")]
    ManifestWrite(String),

    #[error("Sweep error: {0}")]
    Sweep(String),
}

impl From<csv::Error> for BackupError {
    fn from(e: csv::Error) -> Self {
        BackupError::Export(e.to_string())
    }
}
