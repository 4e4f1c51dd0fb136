//! Run command implementation - applies pending migrations

use anyhow::Result;
use tern_migrate::{RunOptions, RunReport};

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::{load_project, open_database};

/// Execute the run command
pub(crate) async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_database(&project, global)?;

    let options = RunOptions {
        dry_run: args.dry_run,
        ..RunOptions::from_config(&project.config)
    };

    let report = tern_migrate::run(&db, &project.migrations_dir(), &options).await?;
    print_report(&report, global.verbose);
    Ok(())
}

fn print_report(report: &RunReport, verbose: bool) {
    if report.applied.is_empty() {
        println!("All migration files are present in the database.");
        return;
    }

    if report.dry_run {
        println!("Dry run - the following migrations would be applied:");
        for name in &report.applied {
            println!("  - {name}");
        }
        return;
    }

    println!("Applied {} migration(s):", report.applied.len());
    for name in &report.applied {
        println!("  - {name}");
    }
    if verbose {
        println!(
            "{} already applied, {} applied now",
            report.already_applied,
            report.applied.len()
        );
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
