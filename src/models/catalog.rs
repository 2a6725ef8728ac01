//! Database catalog types.

/// Server-internal databases that are never discovered or backed up.
/// Matched exactly, case-sensitive, as the server reports names.
pub const SYSTEM_DATABASES: [&str; 4] =
    ["information_schema", "performance_schema", "mysql", "sys"];

pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES.contains(&name)
}

/// One discovered user database with its base tables, in the order the
/// server reported them. Order is stable within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseCatalogEntry {
    pub name: String,
    pub tables: Vec<String>,
}

/// All rows of one table, every value rendered to text (NULL becomes an
/// empty field).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_databases_are_excluded_exactly() {
        assert!(is_system_database("mysql"));
        assert!(is_system_database("information_schema"));
        assert!(is_system_database("performance_schema"));
        assert!(is_system_database("sys"));
        assert!(!is_system_database("sampledb"));
        // Exact, case-sensitive match only.
        assert!(!is_system_database("MySQL"));
        assert!(!is_system_database("sys2"));
    }
}
