//! Read-only report of which migrations are applied and which are pending

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tern_core::{discover_artifacts, ArtifactFile, MigrationName};
use tern_db::{Database, LedgerEntry};

use crate::error::{MigrateError, MigrateResult};
use crate::runner::plan;

/// Whether an artifact is recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Applied,
    Pending,
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationState::Applied => write!(f, "applied"),
            MigrationState::Pending => write!(f, "pending"),
        }
    }
}

/// One artifact and its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub id: String,
    pub name: MigrationName,
    pub state: MigrationState,
}

/// All artifacts in file-name order plus ledger names with no file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub migrations: Vec<StatusEntry>,
    pub orphaned: Vec<String>,
}

impl StatusReport {
    /// Number of pending migrations.
    pub fn pending_count(&self) -> usize {
        self.migrations
            .iter()
            .filter(|m| m.state == MigrationState::Pending)
            .count()
    }
}

/// Compare the migrations in `dir` with the ledger without changing anything.
///
/// The ledger is read inside a transaction that is always rolled back, so a
/// missing ledger table is treated as empty and never created.
pub async fn status(
    db: &dyn Database,
    dir: &Path,
    ledger_table: &str,
) -> MigrateResult<StatusReport> {
    let artifacts = discover_artifacts(dir)?;

    db.begin()
        .await
        .map_err(|source| MigrateError::Transaction { source })?;
    let ledger = match db.ensure_ledger(ledger_table).await {
        Ok(()) => db.fetch_ledger(ledger_table).await,
        Err(e) => Err(e),
    };
    if let Err(e) = db.rollback().await {
        log::warn!("Rollback after status read failed: {e}");
    }
    let ledger = ledger.map_err(|source| MigrateError::Ledger { source })?;

    Ok(build_report(&artifacts, &ledger))
}

/// Report every migration in `dir` as pending, for a database that does not
/// exist yet.
pub fn status_without_database(dir: &Path) -> MigrateResult<StatusReport> {
    let artifacts = discover_artifacts(dir)?;
    Ok(build_report(&artifacts, &[]))
}

fn build_report(artifacts: &[ArtifactFile], ledger: &[LedgerEntry]) -> StatusReport {
    let plan = plan(artifacts, ledger);
    let pending: HashSet<&str> = plan.pending.iter().map(|a| a.name.as_str()).collect();
    let migrations = artifacts
        .iter()
        .map(|a| StatusEntry {
            id: a.name.id().to_string(),
            name: a.name.clone(),
            state: if pending.contains(a.name.as_str()) {
                MigrationState::Pending
            } else {
                MigrationState::Applied
            },
        })
        .collect();

    StatusReport {
        migrations,
        orphaned: plan.orphaned,
    }
}
