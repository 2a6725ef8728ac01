//! Full-database SQL dump.
//!
//! The structural+data export (schema, rows, triggers, routines) is
//! delegated to an external dump tool behind the [`DumpTool`] trait. The
//! artifact is only written after the tool succeeded, so a failed dump
//! never leaves a truncated file on disk.

use crate::config::EngineConfig;
use crate::error::BackupError;
use crate::models::artifact::{full_dump_name, ArtifactFormat, CycleStamp, ExportArtifact};
use crate::models::labels::LabelSnapshot;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Captured output of one dump invocation.
#[derive(Debug, Clone)]
pub struct DumpOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub success: bool,
}

#[async_trait]
pub trait DumpTool: Send + Sync {
    /// Produce the full dump of one database as an opaque byte stream
    /// plus exit status.
    async fn produce_dump(&self, database: &str) -> Result<DumpOutput>;
}

/// Invokes `mysqldump` as a subprocess. The password travels through the
/// `MYSQL_PWD` environment variable, never through process arguments.
pub struct MysqldumpTool {
    host: String,
    port: u16,
    user: String,
    password: String,
}

impl MysqldumpTool {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            host: config.db_host.clone(),
            port: config.db_port,
            user: config.db_user.clone(),
            password: config.db_password.clone(),
        }
    }
}

#[async_trait]
impl DumpTool for MysqldumpTool {
    async fn produce_dump(&self, database: &str) -> Result<DumpOutput> {
        let output = Command::new("mysqldump")
            .arg(format!("--host={}", self.host))
            .arg(format!("--port={}", self.port))
            .arg(format!("--user={}", self.user))
            .arg("--single-transaction")
            .arg("--routines")
            .arg("--triggers")
            .arg(database)
            .env("MYSQL_PWD", &self.password)
            .output()
            .await
            .map_err(|e| BackupError::Dump(format!("failed to run mysqldump: {e}")))?;

        Ok(DumpOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }
}

/// Dump one database and write its `<db>_full_backup_<stamp>.sql`
/// artifact with the metadata header embedded as SQL comments. Isolated
/// per database; a failure here never cancels sibling exports.
pub async fn export_database(
    tool: &dyn DumpTool,
    database: &str,
    labels: &LabelSnapshot,
    stamp: &CycleStamp,
    out_dir: &Path,
) -> Result<ExportArtifact> {
    let dump = tool.produce_dump(database).await?;

    if !dump.success {
        return Err(BackupError::Dump(format!(
            "mysqldump failed for '{database}': {}",
            dump.stderr.trim()
        )));
    }

    let path = out_dir.join(full_dump_name(database, &stamp.token));
    let mut contents = dump_header(database, labels, stamp).into_bytes();
    contents.extend_from_slice(&dump.stdout);

    std::fs::write(&path, contents)
        .map_err(|e| BackupError::Dump(format!("{}: {e}", path.display())))?;

    tracing::info!(file = %path.display(), "SQL backup completed");

    Ok(ExportArtifact {
        path,
        database: database.to_string(),
        table: None,
        format: ArtifactFormat::Sql,
        record_count: None,
        cycle_stamp: stamp.token.clone(),
    })
}

fn dump_header(database: &str, labels: &LabelSnapshot, stamp: &CycleStamp) -> String {
    let mut header = String::new();
    header.push_str("-- Database Backup Metadata\n");
    header.push_str(&format!("-- Database: {database}\n"));
    header.push_str(&format!("-- Backup Time: {}\n", stamp.date));
    header.push_str("-- Format: SQL\n");
    header.push_str("-- Generated by: MySQL Database Backup Service\n");
    for line in labels.metadata_lines() {
        header.push_str(&format!("-- {line}\n"));
    }
    header.push('\n');
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::labels::keys;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    struct FakeDumpTool {
        succeed: bool,
    }

    #[async_trait]
    impl DumpTool for FakeDumpTool {
        async fn produce_dump(&self, database: &str) -> Result<DumpOutput> {
            Ok(DumpOutput {
                stdout: format!("CREATE TABLE `{database}`.`t` (id INT);\n").into_bytes(),
                stderr: if self.succeed {
                    String::new()
                } else {
                    "Access denied".to_string()
                },
                success: self.succeed,
            })
        }
    }

    fn stamp() -> CycleStamp {
        CycleStamp::at(Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
    }

    #[tokio::test]
    async fn successful_dump_writes_header_then_body() {
        let dir = TempDir::new().unwrap();
        let tool = FakeDumpTool { succeed: true };

        let artifact = export_database(
            &tool,
            "sampledb",
            &LabelSnapshot::empty(),
            &stamp(),
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(artifact.table, None);
        assert_eq!(artifact.format, ArtifactFormat::Sql);

        let contents = std::fs::read_to_string(&artifact.path).unwrap();
        assert!(contents.starts_with("-- Database Backup Metadata\n"));
        assert!(contents.contains("-- Database: sampledb"));
        assert!(contents.contains("CREATE TABLE"));
        // Header strictly precedes the body.
        assert!(
            contents.find("-- Format: SQL").unwrap() < contents.find("CREATE TABLE").unwrap()
        );
    }

    #[tokio::test]
    async fn failed_dump_leaves_no_file_behind() {
        let dir = TempDir::new().unwrap();
        let tool = FakeDumpTool { succeed: false };

        let err = export_database(
            &tool,
            "sampledb",
            &LabelSnapshot::empty(),
            &stamp(),
            dir.path(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BackupError::Dump(_)));
        assert!(err.to_string().contains("Access denied"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn header_renders_labels_as_sql_comments() {
        let labels = LabelSnapshot {
            container: [(keys::DATABASE_TYPE.to_string(), "mysql".to_string())]
                .into_iter()
                .collect(),
            service: Default::default(),
        };
        let header = dump_header("okul", &labels, &stamp());
        assert!(header.contains("-- Container Labels:\n"));
        assert!(header.contains("--   Database Type: mysql\n"));
        assert!(header.ends_with("\n\n"));
    }
}
