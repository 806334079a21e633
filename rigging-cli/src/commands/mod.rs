pub mod config;
pub mod daemon;
pub mod diff;
pub mod event;
pub mod init;
pub mod require;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rigging_core::{
    settings, ManifestProject, ManifestSolution, ProjectHost, ProjectModel, Settings,
};

pub(crate) fn open_solution(path: &Path) -> Result<ManifestSolution> {
    ManifestSolution::open(path)
        .with_context(|| format!("cannot open solution '{}'", path.display()))
}

pub(crate) fn open_project(
    solution: &ManifestSolution,
    name: &str,
) -> Result<ManifestProject> {
    solution
        .open_project(name)
        .with_context(|| format!("cannot open project '{name}'"))
}

/// Directory of a project listed in the solution.
pub(crate) fn project_dir(solution_path: &Path, name: &str) -> Result<PathBuf> {
    let solution = open_solution(solution_path)?;
    Ok(open_project(&solution, name)?.directory().to_path_buf())
}

pub(crate) fn load_settings() -> Result<Settings> {
    settings::load().context("failed to load settings from ~/.rigging/config.yaml")
}
