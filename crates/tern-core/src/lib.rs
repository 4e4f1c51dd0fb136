//! tern-core - Core library for tern
//!
//! This crate provides the shared pieces used by the scaffolder and the
//! runner: project configuration, the migration naming convention, the
//! artifact file format, and migrations-directory discovery.

pub mod artifact;
pub mod config;
pub mod discovery;
pub mod error;
pub mod migration_name;

pub use artifact::{Migration, APPLY_MARKER, REVERT_MARKER};
pub use config::{Config, DatabaseConfig, DbType};
pub use discovery::{discover_artifacts, ArtifactFile, ARTIFACT_EXTENSION};
pub use error::{CoreError, CoreResult};
pub use migration_name::{MigrationName, TIMESTAMP_FORMAT, TIMESTAMP_LEN};
