//! Migration artifact format.
//!
//! An artifact is a `.sql` file split into sections by marker lines:
//!
//! ```sql
//! -- migrate:apply
//! CREATE TABLE users (id INTEGER);
//!
//! -- migrate:revert
//! DROP TABLE users;
//! ```
//!
//! Text before the first marker is ignored. Only the apply section is ever
//! executed; revert is kept so artifacts stay self-describing.

use crate::discovery::ArtifactFile;
use crate::error::{CoreError, CoreResult};
use crate::migration_name::MigrationName;

/// Marker line opening the apply section.
pub const APPLY_MARKER: &str = "-- migrate:apply";

/// Marker line opening the revert section.
pub const REVERT_MARKER: &str = "-- migrate:revert";

/// Body written by the scaffolder: both sections present and empty.
const TEMPLATE: &str = "-- migrate:apply\n\n\n-- migrate:revert\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Apply,
    Revert,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Section::Apply => "apply",
            Section::Revert => "revert",
        }
    }
}

/// A loaded migration: its name plus the SQL of each section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Artifact identifier (`<timestamp>_<label>`)
    pub name: MigrationName,
    /// Forward SQL
    pub apply: String,
    /// Backward SQL, if the artifact declares a revert section
    pub revert: Option<String>,
}

impl Migration {
    /// Parse artifact `content` belonging to `name`.
    pub fn parse(name: MigrationName, content: &str) -> CoreResult<Self> {
        let mut current: Option<Section> = None;
        let mut apply: Option<Vec<&str>> = None;
        let mut revert: Option<Vec<&str>> = None;

        for line in content.lines() {
            let marker = match line.trim() {
                APPLY_MARKER => Some(Section::Apply),
                REVERT_MARKER => Some(Section::Revert),
                _ => None,
            };

            if let Some(section) = marker {
                let slot = match section {
                    Section::Apply => &mut apply,
                    Section::Revert => &mut revert,
                };
                if slot.is_some() {
                    return Err(CoreError::DuplicateSection {
                        name: name.to_string(),
                        section: section.label().to_string(),
                    });
                }
                *slot = Some(Vec::new());
                current = Some(section);
                continue;
            }

            let body = match current {
                Some(Section::Apply) => apply.as_mut(),
                Some(Section::Revert) => revert.as_mut(),
                None => None,
            };
            if let Some(lines) = body {
                lines.push(line);
            }
        }

        let Some(apply) = apply else {
            return Err(CoreError::MissingApply {
                name: name.to_string(),
            });
        };

        Ok(Self {
            name,
            apply: join_section(&apply),
            revert: revert.map(|lines| join_section(&lines)),
        })
    }

    /// Read and parse the artifact at `file.path`.
    pub fn load(file: &ArtifactFile) -> CoreResult<Self> {
        let content = std::fs::read_to_string(&file.path).map_err(|e| CoreError::IoWithPath {
            path: file.path.display().to_string(),
            source: e,
        })?;
        Self::parse(file.name.clone(), &content)
    }

    /// The SQL to run when applying this migration.
    pub fn apply_sql(&self) -> &str {
        &self.apply
    }

    /// Whether applying this migration would execute nothing.
    pub fn is_empty(&self) -> bool {
        self.apply.trim().is_empty()
    }

    /// File body for a freshly scaffolded artifact.
    pub fn template() -> &'static str {
        TEMPLATE
    }
}

fn join_section(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
#[path = "artifact_test.rs"]
mod tests;
