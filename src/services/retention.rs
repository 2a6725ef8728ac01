//! Retention sweep.
//!
//! Deletes backup artifacts, manifests and logs whose modification time
//! is strictly older than the retention window. The strict age threshold
//! is what makes the sweep safe against the in-progress cycle's writes:
//! freshly created files can never qualify.

use crate::error::BackupError;
use crate::Result;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// File extensions the sweeper recognizes. Anything else in the output
/// directory is never touched.
pub const SWEPT_EXTENSIONS: [&str; 4] = ["csv", "sql", "json", "log"];

/// Remove recognized files older than `max_age_days` from `out_dir`
/// (non-recursive; all artifacts live flat). Per-file failures are
/// logged and skipped. Returns the number of files removed.
pub fn sweep(out_dir: &Path, max_age_days: u64) -> Result<usize> {
    let cutoff = SystemTime::now() - Duration::from_secs(max_age_days * 24 * 60 * 60);
    sweep_before(out_dir, cutoff)
}

fn sweep_before(out_dir: &Path, cutoff: SystemTime) -> Result<usize> {
    let entries = std::fs::read_dir(out_dir)
        .map_err(|e| BackupError::Sweep(format!("{}: {e}", out_dir.display())))?;

    let mut removed = 0usize;

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable directory entry during sweep");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SWEPT_EXTENSIONS.contains(&ext));
        if !recognized {
            continue;
        }

        let mtime = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "No mtime, skipping");
                continue;
            }
        };

        if mtime < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    removed += 1;
                    tracing::info!(file = %path.display(), "Removed old backup");
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Failed to remove old backup");
                }
            }
        }
    }

    if removed > 0 {
        tracing::info!(removed, "Retention sweep removed old backup files");
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_with_age(dir: &Path, name: &str, age: Duration) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"data").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn removes_only_files_older_than_the_window() {
        let dir = TempDir::new().unwrap();
        let old = write_with_age(dir.path(), "old_backup.csv", 8 * DAY);
        let fresh = write_with_age(dir.path(), "fresh_backup.csv", 6 * DAY);

        let removed = sweep(dir.path(), 7).unwrap();

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn unrecognized_extensions_are_never_touched() {
        let dir = TempDir::new().unwrap();
        let keep = write_with_age(dir.path(), "notes.txt", 30 * DAY);
        let also_keep = write_with_age(dir.path(), "no_extension", 30 * DAY);
        let gone = write_with_age(dir.path(), "manifest.json", 30 * DAY);

        let removed = sweep(dir.path(), 7).unwrap();

        assert_eq!(removed, 1);
        assert!(keep.exists());
        assert!(also_keep.exists());
        assert!(!gone.exists());
    }

    #[test]
    fn all_artifact_kinds_are_swept() {
        let dir = TempDir::new().unwrap();
        for name in [
            "db_t_backup_x.csv",
            "db_full_backup_x.sql",
            "backup_manifest_x.json",
            "backup.log",
        ] {
            write_with_age(dir.path(), name, 10 * DAY);
        }

        assert_eq!(sweep(dir.path(), 7).unwrap(), 4);
    }

    #[test]
    fn sweep_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_with_age(dir.path(), "old.sql", 10 * DAY);

        assert_eq!(sweep(dir.path(), 7).unwrap(), 1);
        assert_eq!(sweep(dir.path(), 7).unwrap(), 0);
    }

    #[test]
    fn subdirectories_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        assert_eq!(sweep(dir.path(), 7).unwrap(), 0);
        assert!(dir.path().join("nested.csv").exists());
    }
}
