//! Error types for tern-core

use thiserror::Error;

/// Core error type for tern
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Migrations directory does not exist
    #[error("[E003] Migrations folder does not exist: {path}")]
    MigrationsDirNotFound { path: String },

    /// E004: Migrations directory holds no artifacts
    #[error("[E004] No migration files found in {path}")]
    NoMigrations { path: String },

    /// E005: File in the migrations directory does not follow `<timestamp>_<label>.sql`
    #[error("[E005] Invalid migration file name '{file}': {reason}")]
    InvalidArtifactName { file: String, reason: String },

    /// E006: Artifact has no apply section
    #[error("[E006] Migration '{name}' does not define an apply section (expected a `-- migrate:apply` line)")]
    MissingApply { name: String },

    /// E007: Artifact declares the same section twice
    #[error("[E007] Migration '{name}' declares the {section} section more than once")]
    DuplicateSection { name: String, section: String },

    /// E008: Label rejected by the scaffolder
    #[error("[E008] Invalid migration label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    /// E009: Generated artifact already exists on disk
    #[error("[E009] Migration file already exists: {path}")]
    ArtifactExists { path: String },

    /// E010: IO error with file path context
    #[error("[E010] IO error on '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E011: Config YAML parse error
    #[error("[E011] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
