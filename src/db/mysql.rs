//! MySQL catalog implementation on top of `mysql_async`.

use crate::config::EngineConfig;
use crate::db::DatabaseCatalog;
use crate::error::BackupError;
use crate::models::catalog::{is_system_database, TableData};
use crate::Result;
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Opts, OptsBuilder, Pool, Row, Value};

pub struct MySqlCatalog {
    pool: Pool,
}

impl MySqlCatalog {
    pub fn connect(config: &EngineConfig) -> Self {
        let opts: Opts = OptsBuilder::default()
            .ip_or_hostname(config.db_host.clone())
            .tcp_port(config.db_port)
            .user(Some(config.db_user.clone()))
            .pass(Some(config.db_password.clone()))
            .into();
        Self {
            pool: Pool::new(opts),
        }
    }

    /// Drain the pool on shutdown.
    pub async fn disconnect(self) {
        if let Err(e) = self.pool.disconnect().await {
            tracing::warn!(error = %e, "Error closing database pool");
        }
    }
}

#[async_trait]
impl DatabaseCatalog for MySqlCatalog {
    async fn ping(&self) -> Result<()> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| BackupError::Connection(e.to_string()))?;
        conn.ping()
            .await
            .map_err(|e| BackupError::Connection(e.to_string()))
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| BackupError::Connection(e.to_string()))?;

        let databases: Vec<String> = conn
            .query("SHOW DATABASES")
            .await
            .map_err(|e| BackupError::Discovery(e.to_string()))?;

        Ok(databases
            .into_iter()
            .filter(|name| !is_system_database(name))
            .collect())
    }

    async fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| BackupError::Connection(e.to_string()))?;

        // SHOW FULL TABLES reports (name, type); restricting to BASE TABLE
        // keeps views out of the export set.
        let query = format!(
            "SHOW FULL TABLES FROM {} WHERE Table_type = 'BASE TABLE'",
            quote_ident(database)
        );
        let tables: Vec<(String, String)> = conn
            .query(query)
            .await
            .map_err(|e| BackupError::Discovery(format!("{database}: {e}")))?;

        Ok(tables.into_iter().map(|(name, _)| name).collect())
    }

    async fn fetch_table(&self, database: &str, table: &str) -> Result<TableData> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| BackupError::Connection(e.to_string()))?;

        let query = format!(
            "SELECT * FROM {}.{}",
            quote_ident(database),
            quote_ident(table)
        );
        let mut result = conn
            .query_iter(query)
            .await
            .map_err(|e| BackupError::Export(format!("{database}.{table}: {e}")))?;

        // Column metadata is present even for empty result sets.
        let columns: Vec<String> = result
            .columns()
            .map(|cols| cols.iter().map(|c| c.name_str().into_owned()).collect())
            .unwrap_or_default();

        let raw: Vec<Row> = result
            .collect()
            .await
            .map_err(|e| BackupError::Export(format!("{database}.{table}: {e}")))?;

        let rows = raw
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row.as_ref(i).map(value_to_string).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(TableData { columns, rows })
    }
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Render a MySQL value as the text that goes into a CSV field.
/// NULL becomes an empty field.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::NULL => String::new(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(y, mo, d, h, mi, s, 0) => {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
        }
        Value::Date(y, mo, d, h, mi, s, us) => {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}")
        }
        Value::Time(neg, days, h, mi, s, us) => {
            let sign = if *neg { "-" } else { "" };
            let hours = u64::from(*days) * 24 + u64::from(*h);
            if *us == 0 {
                format!("{sign}{hours:02}:{mi:02}:{s:02}")
            } else {
                format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renders_empty() {
        assert_eq!(value_to_string(&Value::NULL), "");
    }

    #[test]
    fn scalars_render_plainly() {
        assert_eq!(value_to_string(&Value::Int(-42)), "-42");
        assert_eq!(value_to_string(&Value::UInt(7)), "7");
        assert_eq!(
            value_to_string(&Value::Bytes(b"hello, world".to_vec())),
            "hello, world"
        );
    }

    #[test]
    fn datetime_renders_iso_like() {
        assert_eq!(
            value_to_string(&Value::Date(2026, 3, 7, 4, 5, 6, 0)),
            "2026-03-07 04:05:06"
        );
        assert_eq!(
            value_to_string(&Value::Date(2026, 3, 7, 4, 5, 6, 120)),
            "2026-03-07 04:05:06.000120"
        );
    }

    #[test]
    fn time_folds_days_into_hours() {
        assert_eq!(value_to_string(&Value::Time(false, 1, 2, 3, 4, 0)), "26:03:04");
        assert_eq!(value_to_string(&Value::Time(true, 0, 1, 2, 3, 0)), "-01:02:03");
    }

    #[test]
    fn identifiers_are_backtick_escaped() {
        assert_eq!(quote_ident("sampledb"), "`sampledb`");
        assert_eq!(quote_ident("odd`name"), "`odd``name`");
    }
}
