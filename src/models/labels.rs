//! Deployment-time label metadata.
//!
//! Labels are arbitrary string key/value pairs read from the container
//! runtime every cycle. A handful of keys are well known and drive the
//! metadata headers and the manifest's service block; anything else
//! passes through untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known label keys.
pub mod keys {
    pub const DATABASE_TYPE: &str = "backup.database.type";
    pub const DATABASE_NAME: &str = "backup.database.name";
    pub const DATABASE_VERSION: &str = "backup.database.version";
    pub const PRIORITY: &str = "backup.priority";
    pub const RETENTION_DAYS: &str = "backup.retention.days";
    pub const ENABLED: &str = "backup.enabled";

    pub const WELL_KNOWN: [&str; 6] = [
        DATABASE_TYPE,
        DATABASE_NAME,
        DATABASE_VERSION,
        PRIORITY,
        RETENTION_DAYS,
        ENABLED,
    ];
}

/// Immutable per-cycle snapshot of deployment labels.
///
/// `container` holds the labels of the database container, `service` the
/// labels of the backup service itself. Either namespace may be empty in
/// non-containerized deployments; absence is "unknown", never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSnapshot {
    #[serde(default)]
    pub container: BTreeMap<String, String>,
    #[serde(default)]
    pub service: BTreeMap<String, String>,
}

/// Resolved well-known container labels, with the defaults the manifest
/// records when a label is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub database_type: String,
    pub database_name: String,
    pub database_version: String,
    pub backup_priority: String,
    pub retention_days: String,
    pub backup_enabled: String,
}

impl LabelSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty() && self.service.is_empty()
    }

    /// Look up a container label, falling back to `default` when absent.
    pub fn container_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.container.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Metadata lines rendered into artifact headers (without the
    /// format-specific comment prefix). Empty when no container labels
    /// were available.
    pub fn metadata_lines(&self) -> Vec<String> {
        if self.container.is_empty() {
            return Vec::new();
        }

        let mut lines = vec!["Container Labels:".to_string()];
        lines.push(format!(
            "  Database Type: {}",
            self.container_or(keys::DATABASE_TYPE, "unknown")
        ));
        lines.push(format!(
            "  Database Name: {}",
            self.container_or(keys::DATABASE_NAME, "unknown")
        ));
        lines.push(format!(
            "  Database Version: {}",
            self.container_or(keys::DATABASE_VERSION, "unknown")
        ));
        lines.push(format!(
            "  Backup Priority: {}",
            self.container_or(keys::PRIORITY, "normal")
        ));
        lines.push(format!(
            "  Retention Days: {}",
            self.container_or(keys::RETENTION_DAYS, "7")
        ));

        // Unknown keys pass through so the header is total over any label set.
        for (key, value) in &self.container {
            if !keys::WELL_KNOWN.contains(&key.as_str()) {
                lines.push(format!("  {key}: {value}"));
            }
        }

        lines
    }

    pub fn service_metadata(&self) -> ServiceMetadata {
        ServiceMetadata {
            database_type: self.container_or(keys::DATABASE_TYPE, "unknown").to_string(),
            database_name: self.container_or(keys::DATABASE_NAME, "unknown").to_string(),
            database_version: self
                .container_or(keys::DATABASE_VERSION, "unknown")
                .to_string(),
            backup_priority: self.container_or(keys::PRIORITY, "normal").to_string(),
            retention_days: self.container_or(keys::RETENTION_DAYS, "7").to_string(),
            backup_enabled: self.container_or(keys::ENABLED, "false").to_string(),
        }
    }
}
