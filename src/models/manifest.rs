//! Backup manifest — one JSON document per cycle.
//!
//! The manifest is the durable record of a backup set: cycle timestamp,
//! connection target, format mode, label snapshot and the mapping from
//! database to artifact paths. It is written once per cycle and never
//! updated in place.

use crate::config::FormatMode;
use crate::error::BackupError;
use crate::models::artifact::{ArtifactFormat, CycleStamp, ExportArtifact};
use crate::models::labels::{LabelSnapshot, ServiceMetadata};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Artifacts of one database within a cycle. The full dump lives under a
/// distinguished key, separate from table entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseArtifacts {
    pub tables: BTreeMap<String, PathBuf>,
    pub full_backup: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupManifest {
    pub backup_timestamp: String,
    pub backup_date: String,
    pub database_host: String,
    pub database_port: u16,
    pub backup_format: FormatMode,
    pub container_labels: BTreeMap<String, String>,
    pub service_labels: BTreeMap<String, String>,
    pub service_metadata: ServiceMetadata,
    pub databases: BTreeMap<String, DatabaseArtifacts>,
}

impl BackupManifest {
    /// Group a cycle's artifacts by database and assemble the manifest.
    /// Deterministic for identical inputs: all maps are ordered.
    pub fn build(
        stamp: &CycleStamp,
        host: &str,
        port: u16,
        format: FormatMode,
        labels: &LabelSnapshot,
        artifacts: &[ExportArtifact],
    ) -> Self {
        let mut databases: BTreeMap<String, DatabaseArtifacts> = BTreeMap::new();

        for artifact in artifacts {
            let entry = databases.entry(artifact.database.clone()).or_default();
            match (&artifact.table, artifact.format) {
                (Some(table), ArtifactFormat::Csv) => {
                    entry.tables.insert(table.clone(), artifact.path.clone());
                }
                _ => entry.full_backup = Some(artifact.path.clone()),
            }
        }

        Self {
            backup_timestamp: stamp.token.clone(),
            backup_date: stamp.date.clone(),
            database_host: host.to_string(),
            database_port: port,
            backup_format: format,
            container_labels: labels.container.clone(),
            service_labels: labels.service.clone(),
            service_metadata: labels.service_metadata(),
            databases,
        }
    }

    pub fn file_name(stamp_token: &str) -> String {
        format!("backup_manifest_{stamp_token}.json")
    }

    /// Write the manifest as pretty-printed JSON into `out_dir`.
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join(Self::file_name(&self.backup_timestamp));
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BackupError::ManifestWrite(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| {
            BackupError::ManifestWrite(format!("{}: {e}", path.display()))
        })?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BackupError::ManifestWrite(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| BackupError::ManifestWrite(e.to_string()))
    }

    /// Total artifact files referenced (table exports + full dumps).
    pub fn artifact_count(&self) -> usize {
        self.databases
            .values()
            .map(|db| db.tables.len() + usize::from(db.full_backup.is_some()))
            .sum()
    }
}
