//! MySQL Backup Engine
//!
//! Long-running service that discovers user databases on a MySQL server,
//! exports every table to CSV and every database to a full SQL dump,
//! records each cycle in a JSON manifest and prunes artifacts past the
//! retention window.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
