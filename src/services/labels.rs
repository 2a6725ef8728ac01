//! Container label provider.
//!
//! Reads the deployment labels of the database container and of the
//! backup service itself, once per cycle. Label reads never fail a
//! cycle: any provider error degrades to an empty map with a warning,
//! which downstream consumers treat as "unknown".

use crate::config::EngineConfig;
use crate::models::labels::{keys, LabelSnapshot};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::process::Command;

#[async_trait]
pub trait LabelProvider: Send + Sync {
    /// Labels of one named container. Empty on any failure.
    async fn read_labels(&self, container: &str) -> BTreeMap<String, String>;
}

/// Reads labels through the docker CLI. Works wherever a docker socket
/// and client are available; in non-containerized deployments every read
/// degrades to an empty map.
pub struct DockerCliLabelProvider;

#[async_trait]
impl LabelProvider for DockerCliLabelProvider {
    async fn read_labels(&self, container: &str) -> BTreeMap<String, String> {
        let output = Command::new("docker")
            .args(["inspect", "--format", "{{json .Config.Labels}}", container])
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(container, error = %e, "Could not invoke docker for labels");
                return BTreeMap::new();
            }
        };

        if !output.status.success() {
            tracing::warn!(
                container,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Could not load container labels"
            );
            return BTreeMap::new();
        }

        // A container without labels inspects as literal `null`.
        match serde_json::from_slice::<Option<BTreeMap<String, String>>>(&output.stdout) {
            Ok(labels) => labels.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(container, error = %e, "Unparsable label output");
                BTreeMap::new()
            }
        }
    }
}

/// A fixed label set, for tests and non-docker deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticLabelProvider {
    pub labels: BTreeMap<String, String>,
}

#[async_trait]
impl LabelProvider for StaticLabelProvider {
    async fn read_labels(&self, _container: &str) -> BTreeMap<String, String> {
        self.labels.clone()
    }
}

/// Assemble the per-cycle label snapshot: database container labels plus
/// the backup service's own labels.
pub async fn read_snapshot(provider: &dyn LabelProvider, config: &EngineConfig) -> LabelSnapshot {
    let container = provider.read_labels(&config.db_host).await;
    let service = provider.read_labels(&config.service_name).await;

    if container.is_empty() {
        tracing::warn!(container = %config.db_host, "No container labels available");
    } else {
        tracing::info!(
            container = %config.db_host,
            database_type = %container
                .get(keys::DATABASE_TYPE)
                .map(String::as_str)
                .unwrap_or("unknown"),
            database_version = %container
                .get(keys::DATABASE_VERSION)
                .map(String::as_str)
                .unwrap_or("unknown"),
            "Loaded container labels"
        );
    }

    LabelSnapshot { container, service }
}
