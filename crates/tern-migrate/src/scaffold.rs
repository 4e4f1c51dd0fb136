//! Migration scaffolder - writes a new, empty migration artifact

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tern_core::{CoreError, Migration, MigrationName, ARTIFACT_EXTENSION};

use crate::error::MigrateResult;

/// Label used when the caller does not supply one.
pub const DEFAULT_LABEL: &str = "migration_default";

/// Create `<now>_<label>.sql` in `dir`, timestamped with the current UTC time.
pub fn create(dir: &Path, label: &str) -> MigrateResult<PathBuf> {
    create_at(dir, label, Utc::now())
}

/// Create the artifact for `label` as if scaffolded at `now`.
///
/// The directory is created if missing. An existing file with the same name
/// is never overwritten.
pub fn create_at(dir: &Path, label: &str, now: DateTime<Utc>) -> MigrateResult<PathBuf> {
    validate_label(label)?;

    let name = MigrationName::from_parts(now, label);
    let path = dir.join(format!("{name}.{ARTIFACT_EXTENSION}"));

    fs::create_dir_all(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                CoreError::ArtifactExists {
                    path: path.display().to_string(),
                }
            } else {
                CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;

    file.write_all(Migration::template().as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

    log::debug!("Wrote migration artifact {}", path.display());
    Ok(path)
}

/// Reject labels that would escape the directory or break the naming scheme.
fn validate_label(label: &str) -> Result<(), CoreError> {
    let reason = if label.is_empty() {
        Some("must not be empty")
    } else if label.contains('/') || label.contains('\\') || label.contains("..") {
        Some("must not contain '/', '\\', or '..'")
    } else if label.contains('.') {
        Some("must not contain '.'")
    } else if label.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else if label.starts_with('-') {
        Some("must not start with '-'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CoreError::InvalidLabel {
            label: label.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "scaffold_test.rs"]
mod tests;
