//! Status command implementation - lists applied and pending migrations

use anyhow::{Context, Result};
use tern_migrate::StatusReport;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{load_project, open_existing_database};

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrations_dir = project.migrations_dir();

    // Status never creates the database file; without one, nothing is applied.
    let report = match open_existing_database(&project, global)? {
        Some(db) => {
            tern_migrate::status(&db, &migrations_dir, &project.config.ledger_table).await?
        }
        None => tern_migrate::status_without_database(&migrations_dir)?,
    };

    match args.output {
        StatusOutput::Table => print_table(&report),
        StatusOutput::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize status report")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_table(report: &StatusReport) {
    let width = report
        .migrations
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    println!("{:<8} {:<width$}", "STATE", "NAME");
    for entry in &report.migrations {
        println!("{:<8} {:<width$}", entry.state.to_string(), entry.name.as_str());
    }
    for name in &report.orphaned {
        println!("{:<8} {:<width$}", "missing", name);
    }

    println!();
    println!(
        "{} migration(s), {} pending",
        report.migrations.len(),
        report.pending_count()
    );
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
