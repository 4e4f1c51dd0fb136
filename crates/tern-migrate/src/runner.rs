//! Migration runner.
//!
//! Reconciles the artifacts in the migrations directory against the ledger
//! and applies the missing ones in file-name order. Everything after discovery
//! happens inside one transaction: either every pending migration and its
//! ledger entry is committed, or nothing is.

use std::collections::HashSet;
use std::path::Path;
use tern_core::{discover_artifacts, ArtifactFile, Config, Migration, MigrationName};
use tern_db::{Database, DbError, LedgerEntry};

use crate::error::{MigrateError, MigrateResult};

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Ledger table name
    pub ledger_table: String,
    /// Fail when the ledger names migrations that have no file
    pub strict: bool,
    /// Report what would be applied, then roll back
    pub dry_run: bool,
}

impl RunOptions {
    /// Options taken from the project config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            ledger_table: config.ledger_table.clone(),
            strict: config.strict,
            dry_run: false,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Migrations applied by this run, in order (or that would be, on a dry run)
    pub applied: Vec<MigrationName>,
    /// Number of artifacts already in the ledger
    pub already_applied: usize,
    /// Ledger names with no artifact on disk
    pub orphaned: Vec<String>,
    /// Whether the run was a dry run
    pub dry_run: bool,
}

/// Pending/applied split of the artifacts against a ledger.
#[derive(Debug, PartialEq, Eq)]
pub struct Plan<'a> {
    /// Artifacts missing from the ledger, in file-name order
    pub pending: Vec<&'a ArtifactFile>,
    /// Artifacts already recorded in the ledger
    pub applied: Vec<&'a ArtifactFile>,
    /// Ledger names with no matching artifact, sorted
    pub orphaned: Vec<String>,
}

/// Split sorted `artifacts` into pending and applied according to `ledger`.
pub fn plan<'a>(artifacts: &'a [ArtifactFile], ledger: &[LedgerEntry]) -> Plan<'a> {
    let recorded: HashSet<&str> = ledger.iter().map(|e| e.name.as_str()).collect();
    let (applied, pending): (Vec<_>, Vec<_>) = artifacts
        .iter()
        .partition(|a| recorded.contains(a.name.as_str()));

    let on_disk: HashSet<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
    let mut orphaned: Vec<String> = recorded
        .into_iter()
        .filter(|name| !on_disk.contains(name))
        .map(str::to_string)
        .collect();
    orphaned.sort();

    Plan {
        pending,
        applied,
        orphaned,
    }
}

/// Apply every pending migration found in `dir`.
///
/// Directory errors (missing, empty, malformed names) are raised before a
/// transaction is opened. Any later failure rolls the transaction back.
pub async fn run(
    db: &dyn Database,
    dir: &Path,
    options: &RunOptions,
) -> MigrateResult<RunReport> {
    let artifacts = discover_artifacts(dir)?;
    log::debug!(
        "Found {} migration files in {} ({})",
        artifacts.len(),
        dir.display(),
        db.db_type()
    );

    db.begin()
        .await
        .map_err(|source| MigrateError::Transaction { source })?;

    let result = reconcile_and_apply(db, &artifacts, options).await;
    finish(db, result, options.dry_run).await
}

async fn reconcile_and_apply(
    db: &dyn Database,
    artifacts: &[ArtifactFile],
    options: &RunOptions,
) -> MigrateResult<RunReport> {
    let table = options.ledger_table.as_str();
    db.ensure_ledger(table).await.map_err(ledger_err)?;
    let ledger = db.fetch_ledger(table).await.map_err(ledger_err)?;

    let plan = plan(artifacts, &ledger);
    check_orphans(&plan.orphaned, options.strict)?;

    let mut report = RunReport {
        applied: Vec::with_capacity(plan.pending.len()),
        already_applied: plan.applied.len(),
        orphaned: plan.orphaned.clone(),
        dry_run: options.dry_run,
    };

    if plan.pending.is_empty() {
        log::info!("All migration files are present in the database");
        return Ok(report);
    }

    if options.dry_run {
        report
            .applied
            .extend(plan.pending.iter().map(|a| a.name.clone()));
        return Ok(report);
    }

    let mut staged = Vec::with_capacity(plan.pending.len());
    for artifact in &plan.pending {
        let migration = Migration::load(artifact)?;
        staged.push(apply_one(db, &migration).await?);
        report.applied.push(migration.name);
    }

    db.record_migrations(table, &staged)
        .await
        .map_err(ledger_err)?;
    Ok(report)
}

/// Execute one migration's apply SQL and return its ledger entry.
async fn apply_one(db: &dyn Database, migration: &Migration) -> MigrateResult<LedgerEntry> {
    if migration.is_empty() {
        log::warn!(
            "Migration {} has an empty apply section; recording it without executing",
            migration.name
        );
    } else {
        log::debug!("Applying migration {}", migration.name);
        db.execute_batch(migration.apply_sql())
            .await
            .map_err(|source| MigrateError::ApplyFailed {
                name: migration.name.to_string(),
                source,
            })?;
    }
    Ok(LedgerEntry::for_migration(&migration.name))
}

fn check_orphans(orphaned: &[String], strict: bool) -> MigrateResult<()> {
    if orphaned.is_empty() {
        return Ok(());
    }
    if strict {
        return Err(MigrateError::UnknownLedgerEntries {
            names: orphaned.to_vec(),
        });
    }
    for name in orphaned {
        log::warn!("Ledger entry {name} has no matching migration file");
    }
    Ok(())
}

/// Commit on success (rollback on a dry run), roll back on failure.
async fn finish(
    db: &dyn Database,
    result: MigrateResult<RunReport>,
    dry_run: bool,
) -> MigrateResult<RunReport> {
    match result {
        Ok(report) if dry_run => {
            db.rollback()
                .await
                .map_err(|source| MigrateError::Transaction { source })?;
            Ok(report)
        }
        Ok(report) => {
            if let Err(source) = db.commit().await {
                rollback_quietly(db).await;
                return Err(MigrateError::Transaction { source });
            }
            Ok(report)
        }
        Err(err) => {
            rollback_quietly(db).await;
            Err(err)
        }
    }
}

/// Roll back after a primary error; a failing ROLLBACK must not mask it.
async fn rollback_quietly(db: &dyn Database) {
    if let Err(e) = db.rollback().await {
        log::error!("Rollback failed: {e}");
    }
}

fn ledger_err(source: DbError) -> MigrateError {
    MigrateError::Ledger { source }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
