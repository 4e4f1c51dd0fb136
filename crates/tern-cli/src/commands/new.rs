//! New command implementation - scaffolds an empty migration file

use anyhow::{Context, Result};
use tern_migrate::DEFAULT_LABEL;

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::load_project;

/// Execute the new command
pub(crate) async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let label = args.name.as_deref().unwrap_or(DEFAULT_LABEL);

    let path = tern_migrate::create(&project.migrations_dir(), label)
        .context("Error creating migration file")?;

    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    println!("Migration file created: {file_name}");
    Ok(())
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
