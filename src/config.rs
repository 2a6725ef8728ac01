//! Configuration management for the backup engine.
//!
//! Loads configuration from environment variables with defaults. An
//! unparsable value is the single fatal condition in the whole engine:
//! it is detected once at startup, before any cycle runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which artifact kinds a cycle produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    Csv,
    Sql,
    Both,
}

impl FormatMode {
    pub fn includes_csv(self) -> bool {
        matches!(self, FormatMode::Csv | FormatMode::Both)
    }

    pub fn includes_sql(self) -> bool {
        matches!(self, FormatMode::Sql | FormatMode::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatMode::Csv => "csv",
            FormatMode::Sql => "sql",
            FormatMode::Both => "both",
        }
    }
}

impl FromStr for FormatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(FormatMode::Csv),
            "sql" => Ok(FormatMode::Sql),
            "both" => Ok(FormatMode::Both),
            other => Err(format!("expected csv, sql or both, got '{other}'")),
        }
    }
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    /// Container/service name of the backup engine itself, for reading
    /// its own labels.
    pub service_name: String,
    pub backup_dir: PathBuf,
    pub interval_hours: u64,
    pub format: FormatMode,
    pub retention_days: u64,
    pub log_level: String,
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let db_password = std::env::var("DB_PASSWORD").map_err(|_| {
            anyhow::anyhow!(
                "DB_PASSWORD is not set. Provide it via environment variables \
                 (recommended via a local .env file)."
            )
        })?;

        let config = Self {
            db_host: std::env::var("DB_HOST").unwrap_or_else(|_| "mysql".into()),
            db_port: env_parse("DB_PORT", 3306)?,
            db_user: std::env::var("DB_USER").unwrap_or_else(|_| "root".into()),
            db_password,
            service_name: std::env::var("BACKUP_SERVICE_NAME")
                .unwrap_or_else(|_| "backup-service".into()),
            backup_dir: PathBuf::from(
                std::env::var("BACKUP_DIR").unwrap_or_else(|_| "/app/backups".into()),
            ),
            interval_hours: env_parse("BACKUP_INTERVAL_HOURS", 6)?,
            format: env_parse("BACKUP_FORMAT", FormatMode::Both)?,
            retention_days: env_parse("RETENTION_DAYS", 7)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        };

        if config.interval_hours == 0 {
            anyhow::bail!("BACKUP_INTERVAL_HOURS must be at least 1");
        }
        if config.retention_days == 0 {
            anyhow::bail!("RETENTION_DAYS must be at least 1");
        }

        Ok(config)
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid value for {key}: '{raw}'")),
        Err(_) => Ok(default),
    }
}
