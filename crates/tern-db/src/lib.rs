//! tern-db - Database abstraction layer for tern
//!
//! This crate provides the `Database` trait the migration runner talks to,
//! the ledger record type, and a DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod ledger;
pub mod traits;

pub use self::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use ledger::LedgerEntry;
pub use traits::Database;
