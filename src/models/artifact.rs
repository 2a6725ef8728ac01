//! Export artifacts and cycle timestamps.
//!
//! Artifacts are write-once files. The naming scheme encodes database,
//! table (for table exports), a literal `backup` marker and the cycle
//! timestamp, so two artifacts from one cycle never collide and files
//! sort and group by timestamp.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Timestamp of one backup cycle, in both of its representations: the
/// compact sortable token used in filenames and the human-readable date
/// used in headers and the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStamp {
    /// `YYYYMMDD_HHMMSS`, fixed width, filename safe.
    pub token: String,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub date: String,
}

impl CycleStamp {
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    pub fn at(dt: DateTime<Local>) -> Self {
        Self {
            token: dt.format("%Y%m%d_%H%M%S").to_string(),
            date: dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Csv,
    Sql,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Csv => "csv",
            ArtifactFormat::Sql => "sql",
        }
    }
}

/// One produced backup file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub database: String,
    /// Absent for full-database dumps.
    pub table: Option<String>,
    pub format: ArtifactFormat,
    /// Data rows written for table exports; best-effort (absent) for
    /// full dumps.
    pub record_count: Option<u64>,
    /// Token of the cycle that produced this artifact.
    pub cycle_stamp: String,
}

/// `<database>_<table>_backup_<stamp>.csv`
pub fn table_artifact_name(database: &str, table: &str, stamp_token: &str) -> String {
    format!("{database}_{table}_backup_{stamp_token}.csv")
}

/// `<database>_full_backup_<stamp>.sql`
pub fn full_dump_name(database: &str, stamp_token: &str) -> String {
    format!("{database}_full_backup_{stamp_token}.sql")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamp_has_both_representations() {
        let dt = Local.with_ymd_and_hms(2026, 3, 7, 4, 5, 6).unwrap();
        let stamp = CycleStamp::at(dt);
        assert_eq!(stamp.token, "20260307_040506");
        assert_eq!(stamp.date, "2026-03-07 04:05:06");
    }

    #[test]
    fn artifact_names_encode_entity_and_stamp() {
        assert_eq!(
            table_artifact_name("sampledb", "products", "20260307_040506"),
            "sampledb_products_backup_20260307_040506.csv"
        );
        assert_eq!(
            full_dump_name("sampledb", "20260307_040506"),
            "sampledb_full_backup_20260307_040506.sql"
        );
    }

    #[test]
    fn names_within_one_cycle_never_collide() {
        let stamp = "20260307_040506";
        let names = [
            table_artifact_name("sampledb", "products", stamp),
            table_artifact_name("sampledb", "categories", stamp),
            table_artifact_name("okul", "ogrenciler", stamp),
            full_dump_name("sampledb", stamp),
            full_dump_name("okul", stamp),
        ];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
