//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::ledger::{self, LedgerEntry};
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn transaction_sync(&self, action: &'static str, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::TransactionError {
                action,
                message: e.to_string(),
            })
    }

    fn fetch_ledger_sync(&self, table: &str) -> DbResult<Vec<LedgerEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&ledger::select_sql(table))?;
        let rows = stmt.query_map([], |row| {
            Ok(LedgerEntry {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let entries = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn record_migrations_sync(&self, table: &str, entries: &[LedgerEntry]) -> DbResult<()> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&ledger::insert_sql(table))?;
        for entry in entries {
            stmt.execute(duckdb::params![entry.id, entry.name])
                .map_err(|e| {
                    DbError::ExecutionError(format!("failed to record '{}': {e}", entry.name))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction_sync("BEGIN", "BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_sync("COMMIT", "COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_sync("ROLLBACK", "ROLLBACK")
    }

    async fn ensure_ledger(&self, table: &str) -> DbResult<()> {
        if let Some(schema) = ledger::schema_of(table) {
            self.execute_batch_sync(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))?;
        }
        self.execute_batch_sync(&ledger::create_table_sql(table))
    }

    async fn fetch_ledger(&self, table: &str) -> DbResult<Vec<LedgerEntry>> {
        self.fetch_ledger_sync(table)
    }

    async fn record_migrations(&self, table: &str, entries: &[LedgerEntry]) -> DbResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        log::debug!("Recording {} ledger entries in {table}", entries.len());
        self.record_migrations_sync(table, entries)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
