//! tern-migrate - scaffold and apply schema migrations
//!
//! [`scaffold::create`] writes a new timestamped artifact into the
//! migrations directory. [`runner::run`] applies every artifact missing from
//! the ledger, in file-name order, inside a single transaction.

pub mod error;
pub mod runner;
pub mod scaffold;
pub mod status;

pub use error::{MigrateError, MigrateResult};
pub use runner::{plan, run, Plan, RunOptions, RunReport};
pub use scaffold::{create, create_at, DEFAULT_LABEL};
pub use status::{status, status_without_database, MigrationState, StatusEntry, StatusReport};
