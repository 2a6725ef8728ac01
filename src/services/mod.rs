pub mod csv_export;
pub mod labels;
pub mod retention;
pub mod scheduler;
pub mod sql_dump;
