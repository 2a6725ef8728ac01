//! Scheduler and health loop.
//!
//! One logical worker: wait for the database with backoff, run one full
//! cycle (discovery, per-table exports, full dumps, manifest, sweep),
//! sleep the configured interval, repeat forever. No failure inside a
//! cycle terminates the process; connectivity is re-validated before
//! every cycle since the intervals are long.

use crate::config::EngineConfig;
use crate::db::DatabaseCatalog;
use crate::models::artifact::{CycleStamp, ExportArtifact};
use crate::models::catalog::{is_system_database, DatabaseCatalogEntry};
use crate::models::manifest::BackupManifest;
use crate::services::csv_export;
use crate::services::labels::{self, LabelProvider};
use crate::services::retention;
use crate::services::sql_dump::{self, DumpTool};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Connection retry backoff grows in 5s steps up to this bound; retries
/// themselves are unbounded.
const RETRY_STEP_SECS: u64 = 5;
const RETRY_MAX_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    WaitingForDb,
    RunningCycle,
    Sleeping,
    Terminated,
}

/// Outcome of one backup cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub stamp: CycleStamp,
    pub artifacts: Vec<ExportArtifact>,
    /// Isolated per-entity failures (table exports, dumps, table listing).
    pub failures: usize,
    pub swept: usize,
}

pub struct BackupEngine {
    config: EngineConfig,
    catalog: Arc<dyn DatabaseCatalog>,
    dump_tool: Arc<dyn DumpTool>,
    labels: Arc<dyn LabelProvider>,
    state: EngineState,
}

impl BackupEngine {
    pub fn new(
        config: EngineConfig,
        catalog: Arc<dyn DatabaseCatalog>,
        dump_tool: Arc<dyn DumpTool>,
        labels: Arc<dyn LabelProvider>,
    ) -> Self {
        Self {
            config,
            catalog,
            dump_tool,
            labels,
            state: EngineState::WaitingForDb,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run forever until `cancel` fires. A failed cycle is logged and the
    /// loop proceeds to sleep regardless.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let interval = Duration::from_secs(self.config.interval_hours * 3600);
        tracing::info!(
            interval_hours = self.config.interval_hours,
            format = %self.config.format,
            "Starting backup scheduler"
        );

        loop {
            self.state = EngineState::WaitingForDb;
            if !self.wait_for_db(&cancel).await {
                break;
            }

            self.state = EngineState::RunningCycle;
            match self.run_cycle().await {
                Ok(report) => tracing::info!(
                    stamp = %report.stamp.token,
                    artifacts = report.artifacts.len(),
                    failures = report.failures,
                    swept = report.swept,
                    "Backup cycle complete"
                ),
                Err(e) => tracing::error!(error = %e, "Backup cycle abandoned"),
            }

            self.state = EngineState::Sleeping;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        self.state = EngineState::Terminated;
        tracing::info!("Backup scheduler stopped");
    }

    /// Wait for connectivity, then run exactly one cycle.
    pub async fn run_once(&mut self, cancel: CancellationToken) -> Result<CycleReport> {
        self.state = EngineState::WaitingForDb;
        if !self.wait_for_db(&cancel).await {
            self.state = EngineState::Terminated;
            return Err(crate::error::BackupError::Connection(
                "cancelled while waiting for database".into(),
            ));
        }
        self.state = EngineState::RunningCycle;
        let report = self.run_cycle().await;
        self.state = EngineState::Terminated;
        report
    }

    /// Retry until the server answers a ping. Returns false only when
    /// cancelled; a down database is expected and recoverable.
    async fn wait_for_db(&self, cancel: &CancellationToken) -> bool {
        let mut attempt = 0u64;
        loop {
            if cancel.is_cancelled() {
                return false;
            }

            match self.catalog.ping().await {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::info!(attempts = attempt + 1, "Database connection established");
                    }
                    return true;
                }
                Err(e) => {
                    attempt += 1;
                    let delay = (RETRY_STEP_SECS * attempt).min(RETRY_MAX_SECS);
                    tracing::warn!(
                        attempt,
                        retry_in_secs = delay,
                        error = %e,
                        "Database connection failed, retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return false,
                        _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
                    }
                }
            }
        }
    }

    /// One full cycle: labels, discovery, exports, manifest, sweep.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let stamp = CycleStamp::now();
        tracing::info!(stamp = %stamp.token, "Starting backup cycle");

        // Labels are re-read every cycle; absence is not an error.
        let snapshot = labels::read_snapshot(self.labels.as_ref(), &self.config).await;

        // Discovery failure abandons this cycle only.
        let names: Vec<String> = self
            .catalog
            .list_databases()
            .await?
            .into_iter()
            .filter(|name| !is_system_database(name))
            .collect();

        if names.is_empty() {
            tracing::warn!("No databases found to back up");
        }

        let mut failures = 0usize;

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let tables = if self.config.format.includes_csv() {
                match self.catalog.list_tables(&name).await {
                    Ok(tables) => tables,
                    Err(e) => {
                        failures += 1;
                        tracing::error!(database = %name, error = %e, "Table discovery failed");
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };
            entries.push(DatabaseCatalogEntry { name, tables });
        }

        let mut artifacts = Vec::new();

        for entry in &entries {
            tracing::info!(database = %entry.name, tables = entry.tables.len(), "Backing up database");

            if self.config.format.includes_csv() {
                for table in &entry.tables {
                    match csv_export::export_table(
                        self.catalog.as_ref(),
                        &entry.name,
                        table,
                        &snapshot,
                        &stamp,
                        &self.config.backup_dir,
                    )
                    .await
                    {
                        Ok(artifact) => artifacts.push(artifact),
                        Err(e) => {
                            failures += 1;
                            tracing::error!(
                                database = %entry.name,
                                table = %table,
                                error = %e,
                                "Table export failed"
                            );
                        }
                    }
                }
            }

            if self.config.format.includes_sql() {
                match sql_dump::export_database(
                    self.dump_tool.as_ref(),
                    &entry.name,
                    &snapshot,
                    &stamp,
                    &self.config.backup_dir,
                )
                .await
                {
                    Ok(artifact) => artifacts.push(artifact),
                    Err(e) => {
                        failures += 1;
                        tracing::error!(database = %entry.name, error = %e, "Full dump failed");
                    }
                }
            }
        }

        // Manifest write failure is soft: the cycle keeps its artifacts.
        let manifest = BackupManifest::build(
            &stamp,
            &self.config.db_host,
            self.config.db_port,
            self.config.format,
            &snapshot,
            &artifacts,
        );
        match manifest.write(&self.config.backup_dir) {
            Ok(path) => tracing::info!(file = %path.display(), "Backup manifest created"),
            Err(e) => tracing::error!(error = %e, "Failed to write backup manifest"),
        }

        let swept = match retention::sweep(&self.config.backup_dir, self.config.retention_days) {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Retention sweep failed");
                0
            }
        };

        Ok(CycleReport {
            stamp,
            artifacts,
            failures,
            swept,
        })
    }
}
