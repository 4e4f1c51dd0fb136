//! Migrations-directory discovery.

use crate::error::{CoreError, CoreResult};
use crate::migration_name::MigrationName;
use std::path::{Path, PathBuf};

/// File extension of migration artifacts.
pub const ARTIFACT_EXTENSION: &str = "sql";

/// A migration artifact found on disk, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    /// Artifact identifier (file name without extension)
    pub name: MigrationName,
    /// Absolute or root-relative path to the file
    pub path: PathBuf,
}

/// List the artifacts in `dir`, sorted by file name.
///
/// Subdirectories and files without the `.sql` extension are skipped. Every
/// remaining file must be named `<timestamp>_<label>.sql`. A missing
/// directory and a directory with no artifacts are both errors.
pub fn discover_artifacts(dir: &Path) -> CoreResult<Vec<ArtifactFile>> {
    if !dir.is_dir() {
        return Err(CoreError::MigrationsDirNotFound {
            path: dir.display().to_string(),
        });
    }

    let io_err = |e: std::io::Error| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    };

    let mut artifacts = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
            log::debug!("Skipping non-migration file: {}", path.display());
            continue;
        }

        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Err(CoreError::InvalidArtifactName {
                file,
                reason: "file name is not valid UTF-8".to_string(),
            });
        };
        if stem.contains('.') {
            return Err(CoreError::InvalidArtifactName {
                file,
                reason: "name must not contain '.' before the extension".to_string(),
            });
        }
        let name = MigrationName::parse(stem)
            .map_err(|reason| CoreError::InvalidArtifactName { file, reason })?;

        artifacts.push(ArtifactFile { name, path });
    }

    if artifacts.is_empty() {
        return Err(CoreError::NoMigrations {
            path: dir.display().to_string(),
        });
    }

    artifacts.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(artifacts)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
