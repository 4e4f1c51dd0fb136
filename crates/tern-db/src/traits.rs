//! Database trait definition

use crate::error::DbResult;
use crate::ledger::LedgerEntry;
use async_trait::async_trait;

/// Database abstraction trait for tern
///
/// Transaction control and ledger access go through the same handle, so
/// everything the runner does between `begin` and `commit`/`rollback` lands
/// in one transaction. Implementations must be Send + Sync for async
/// operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute one or more SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Start a transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Create the ledger table (and its schema) if it does not exist
    async fn ensure_ledger(&self, table: &str) -> DbResult<()>;

    /// Read every ledger entry, in no particular order
    async fn fetch_ledger(&self, table: &str) -> DbResult<Vec<LedgerEntry>>;

    /// Persist a batch of ledger entries
    async fn record_migrations(&self, table: &str, entries: &[LedgerEntry]) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
