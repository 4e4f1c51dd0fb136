//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tern_core::Config;
use tern_db::DuckDbBackend;

use crate::cli::GlobalArgs;

/// A project root together with its resolved configuration.
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Absolute path of the migrations directory.
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_path_absolute(&self.root)
    }
}

/// Install the `log` backend. `--verbose` lowers the default level to debug;
/// `RUST_LOG` overrides both.
pub(crate) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

/// Load the project at `--project-dir`, honouring `--config`.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = global.project_dir.clone();
    let config = match &global.config {
        Some(path) => Config::load(&resolve(&root, path))
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_from_dir(&root)
            .with_context(|| format!("Failed to load config from {}", root.display()))?,
    };
    Ok(Project { root, config })
}

/// Database location, preferring `--database` over the config.
pub(crate) fn database_path(project: &Project, global: &GlobalArgs) -> String {
    match &global.database {
        Some(path) => path.clone(),
        None => project.config.database_path(&project.root),
    }
}

/// Open the project database, creating the file if needed.
pub(crate) fn open_database(project: &Project, global: &GlobalArgs) -> Result<DuckDbBackend> {
    let path = database_path(project, global);
    log::debug!("Opening {} database at {path}", project.config.database.db_type);
    DuckDbBackend::new(&path).with_context(|| format!("Failed to open database {path}"))
}

/// Open the project database only if its file already exists.
pub(crate) fn open_existing_database(
    project: &Project,
    global: &GlobalArgs,
) -> Result<Option<DuckDbBackend>> {
    let path = database_path(project, global);
    if path != ":memory:" && !Path::new(&path).exists() {
        log::debug!("No database at {path}");
        return Ok(None);
    }
    open_database(project, global).map(Some)
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
