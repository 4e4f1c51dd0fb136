//! Ledger records and the SQL that manages the ledger table.
//!
//! The ledger has two text columns: `id` (the timestamp prefix) and `name`
//! (the full migration name, unique). Table names reaching these builders
//! are validated identifiers from the project config.

use tern_core::MigrationName;

/// One applied migration as stored in the ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerEntry {
    /// Timestamp prefix of the migration name
    pub id: String,
    /// Full migration name, without extension
    pub name: String,
}

impl LedgerEntry {
    /// The entry recording that `name` has been applied.
    pub fn for_migration(name: &MigrationName) -> Self {
        Self {
            id: name.id().to_string(),
            name: name.to_string(),
        }
    }
}

/// Schema part of a possibly schema-qualified table name.
pub(crate) fn schema_of(table: &str) -> Option<&str> {
    table.rfind('.').map(|pos| &table[..pos])
}

pub(crate) fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    id   VARCHAR NOT NULL,\n    name VARCHAR NOT NULL PRIMARY KEY\n)"
    )
}

pub(crate) fn select_sql(table: &str) -> String {
    format!("SELECT id, name FROM {table}")
}

pub(crate) fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (id, name) VALUES (?, ?)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_for_migration() {
        let name = MigrationName::parse("20240102000000_add_col").unwrap();
        let entry = LedgerEntry::for_migration(&name);
        assert_eq!(entry.id, "20240102000000");
        assert_eq!(entry.name, "20240102000000_add_col");
    }

    #[test]
    fn test_schema_of() {
        assert_eq!(schema_of("ops.ledger"), Some("ops"));
        assert_eq!(schema_of("ledger"), None);
    }

    #[test]
    fn test_sql_builders_use_table_name() {
        assert!(create_table_sql("ops.ledger").contains("IF NOT EXISTS ops.ledger"));
        assert_eq!(select_sql("ledger"), "SELECT id, name FROM ledger");
        assert_eq!(
            insert_sql("ledger"),
            "INSERT INTO ledger (id, name) VALUES (?, ?)"
        );
    }
}
