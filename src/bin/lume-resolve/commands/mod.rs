//! Command implementations

pub mod check;
pub mod locate;
pub mod packages;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::cli::GlobalArgs;
use lume_resolve::core::Workspace;
use lume_resolve::util::config::{global_config_path, load_config, project_config_path};
use lume_resolve::util::diagnostic::{emit, suggestions};
use lume_resolve::util::fs::normalize_path;
use lume_resolve::{ResolveError, ResolverConfig, Session};

/// Find the workspace root and load its configuration, applying flag overrides.
pub fn workspace_config(global: &GlobalArgs) -> Result<(PathBuf, ResolverConfig)> {
    let start = match &global.manifest_dir {
        Some(dir) => normalize_path(dir),
        None => std::env::current_dir()?,
    };

    let root = Workspace::find_root(&start).ok_or_else(|| {
        anyhow!(
            "could not find lume.workspace.toml or lume.toml in {} or any parent directory\n\
             help: {}",
            start.display(),
            suggestions::NO_MANIFEST
        )
    })?;

    let mut config = load_config(global_config_path().as_deref(), &project_config_path(&root));
    if let Some(registry) = &global.registry {
        config.registry.path = Some(normalize_path(registry));
    }
    if global.jobs.is_some() {
        config.resolve.jobs = global.jobs;
    }

    if let Some(jobs) = config.jobs() {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            tracing::debug!("keeping the existing thread pool: {}", e);
        }
    }

    tracing::debug!("workspace root: {}", root.display());
    Ok((root, config))
}

/// Open a session, printing fatal registry errors as diagnostics.
pub fn open_session(global: &GlobalArgs) -> Result<Session> {
    let (root, config) = workspace_config(global)?;
    Session::open(&root, config).or_else(|e| fail(&e, global))
}

/// Print `err` as a diagnostic and exit non-zero.
pub fn fail<T>(err: &ResolveError, global: &GlobalArgs) -> Result<T> {
    emit(&err.to_diagnostic(), use_color(global));
    std::process::exit(1);
}

pub fn use_color(global: &GlobalArgs) -> bool {
    !global.no_color && std::io::stderr().is_terminal()
}
