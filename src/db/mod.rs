//! Database introspection.
//!
//! The engine only ever reads: it lists databases and tables and selects
//! rows. The [`DatabaseCatalog`] trait is the seam between the scheduler
//! and the actual server so cycles can be driven by a fake in tests.

pub mod mysql;

use crate::models::catalog::TableData;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DatabaseCatalog: Send + Sync {
    /// Cheap connectivity probe used by the health loop.
    async fn ping(&self) -> Result<()>;

    /// Non-system databases, in server order.
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// Base tables of one database, in server order.
    async fn list_tables(&self, database: &str) -> Result<Vec<String>>;

    /// All rows and column names of one table, values rendered to text.
    async fn fetch_table(&self, database: &str, table: &str) -> Result<TableData>;
}
