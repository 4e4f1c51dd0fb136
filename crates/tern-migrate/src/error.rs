//! Error types for tern-migrate

use tern_core::CoreError;
use tern_db::DbError;
use thiserror::Error;

/// Errors raised while scaffolding or applying migrations
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Environment, artifact, or scaffolding error from tern-core
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database rejected a migration's apply SQL (R001)
    #[error("[R001] Error processing migration file {name}")]
    ApplyFailed {
        name: String,
        #[source]
        source: DbError,
    },

    /// Reading or writing the ledger failed (R002)
    #[error("[R002] Migration ledger update failed")]
    Ledger {
        #[source]
        source: DbError,
    },

    /// The ledger records migrations with no artifact on disk (R003)
    #[error("[R003] Ledger lists migrations with no file on disk: {}", names.join(", "))]
    UnknownLedgerEntries { names: Vec<String> },

    /// BEGIN, COMMIT, or ROLLBACK failed (R004)
    #[error("[R004] Migration transaction failed")]
    Transaction {
        #[source]
        source: DbError,
    },
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
