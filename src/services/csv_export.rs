//! Per-table CSV export.
//!
//! Each table becomes one `<db>_<table>_backup_<stamp>.csv` artifact: a
//! commented metadata header (including the label snapshot), an empty
//! separator row, the column header row, then the data rows. Standard
//! CSV quoting applies throughout — fields containing the delimiter,
//! quote or newline are quoted, inner quotes doubled.

use crate::db::DatabaseCatalog;
use crate::error::BackupError;
use crate::models::artifact::{table_artifact_name, ArtifactFormat, CycleStamp, ExportArtifact};
use crate::models::catalog::TableData;
use crate::models::labels::LabelSnapshot;
use crate::Result;
use std::path::Path;

/// Fetch one table and write its CSV artifact. Failures are scoped to
/// this table; the caller continues with siblings.
pub async fn export_table(
    catalog: &dyn DatabaseCatalog,
    database: &str,
    table: &str,
    labels: &LabelSnapshot,
    stamp: &CycleStamp,
    out_dir: &Path,
) -> Result<ExportArtifact> {
    let data = catalog.fetch_table(database, table).await?;

    let path = out_dir.join(table_artifact_name(database, table, &stamp.token));
    let record_count = write_table_csv(&path, database, table, &data, labels, stamp)?;

    tracing::info!(
        file = %path.display(),
        records = record_count,
        "CSV backup completed"
    );

    Ok(ExportArtifact {
        path,
        database: database.to_string(),
        table: Some(table.to_string()),
        format: ArtifactFormat::Csv,
        record_count: Some(record_count),
        cycle_stamp: stamp.token.clone(),
    })
}

/// Write the artifact file. Returns the number of data rows written;
/// zero rows still produce a well-formed file with header and column row.
pub fn write_table_csv(
    path: &Path,
    database: &str,
    table: &str,
    data: &TableData,
    labels: &LabelSnapshot,
    stamp: &CycleStamp,
) -> Result<u64> {
    let file = std::fs::File::create(path)
        .map_err(|e| BackupError::Export(format!("{}: {e}", path.display())))?;

    // Header records are single-field, data records are N-field.
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);

    writer.write_record(["# Database Backup Metadata"])?;
    writer.write_record([format!("# Database: {database}")])?;
    writer.write_record([format!("# Table: {table}")])?;
    writer.write_record([format!("# Backup Time: {}", stamp.date)])?;
    writer.write_record([format!("# Record Count: {}", data.rows.len())])?;
    writer.write_record(["# Format: CSV"])?;
    for line in labels.metadata_lines() {
        writer.write_record([format!("# {line}")])?;
    }

    // Empty row separating metadata from the table body.
    writer.write_record([""])?;

    writer.write_record(&data.columns)?;
    for row in &data.rows {
        writer.write_record(row)?;
    }

    writer
        .flush()
        .map_err(|e| BackupError::Export(format!("{}: {e}", path.display())))?;

    Ok(data.rows.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::labels::keys;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn stamp() -> CycleStamp {
        CycleStamp::at(Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
    }

    fn sample_data() -> TableData {
        TableData {
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec!["1".into(), "widget".into()],
                vec!["2".into(), "gadget, deluxe".into()],
                vec!["3".into(), "say \"hi\"".into()],
            ],
        }
    }

    #[test]
    fn header_count_matches_body_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sampledb_products_backup_x.csv");

        let count = write_table_csv(
            &path,
            "sampledb",
            "products",
            &sample_data(),
            &LabelSnapshot::empty(),
            &stamp(),
        )
        .unwrap();
        assert_eq!(count, 3);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# Record Count: 3"));

        // Data rows come after the column header row.
        let column_row_idx = contents.lines().position(|l| l == "id,name").unwrap();
        let data_rows = contents
            .lines()
            .skip(column_row_idx + 1)
            .filter(|l| !l.is_empty())
            .count();
        assert_eq!(data_rows, 3);
    }

    #[test]
    fn fields_are_quoted_and_escaped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");

        write_table_csv(
            &path,
            "db",
            "t",
            &sample_data(),
            &LabelSnapshot::empty(),
            &stamp(),
        )
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"gadget, deluxe\""));
        assert!(contents.contains("\"say \"\"hi\"\"\""));
    }

    #[test]
    fn empty_table_still_produces_well_formed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        let data = TableData {
            columns: vec!["id".into(), "name".into()],
            rows: vec![],
        };

        let count = write_table_csv(
            &path,
            "db",
            "empty",
            &data,
            &LabelSnapshot::empty(),
            &stamp(),
        )
        .unwrap();
        assert_eq!(count, 0);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# Record Count: 0"));
        assert!(contents.lines().any(|l| l == "id,name"));
    }

    #[test]
    fn labels_are_rendered_into_the_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labeled.csv");
        let labels = LabelSnapshot {
            container: [
                (keys::DATABASE_TYPE.to_string(), "mysql".to_string()),
                (keys::PRIORITY.to_string(), "high".to_string()),
            ]
            .into_iter()
            .collect(),
            service: Default::default(),
        };

        write_table_csv(&path, "db", "t", &sample_data(), &labels, &stamp()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# Container Labels:"));
        assert!(contents.contains("#   Database Type: mysql"));
        assert!(contents.contains("#   Backup Priority: high"));
    }
}
