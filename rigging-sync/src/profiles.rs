//! Profile repository: one guarded Conan profile per build configuration.
//!
//! Layout under each project directory:
//!
//! ```text
//! <project_dir>/
//!   conandata.yml          (opt-in marker, see requirements)
//!   .conan/
//!     Debug_x64            (profile per configuration)
//!     Release_x64
//!     .runconan            (touched whenever a profile is rewritten)
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rigging_core::{ConfigurationId, ProjectModel, ToolchainReader};

use crate::error::{io_err, SyncError};
use crate::guard::{self, WriteResult};
use crate::requirements;
use crate::translator;

/// Profile directory, relative to the project directory.
pub const PROFILE_DIR: &str = ".conan";
/// Zero-length change marker inside [`PROFILE_DIR`].
pub const CHANGE_MARKER: &str = ".runconan";

pub fn profile_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(PROFILE_DIR)
}

/// `<project_dir>/.conan/<Config>_<Platform>`
pub fn profile_path(project_dir: &Path, id: &ConfigurationId) -> PathBuf {
    profile_dir(project_dir).join(id.profile_name())
}

pub fn marker_path(project_dir: &Path) -> PathBuf {
    profile_dir(project_dir).join(CHANGE_MARKER)
}

/// A project opts in by having a guarded dependency declaration file.
///
/// A user-owned `conandata.yml` does not opt the project in.
pub fn is_opted_in(project_dir: &Path) -> bool {
    let path = requirements::declaration_path(project_dir);
    match guard::is_guarded(&path) {
        Ok(guarded) => guarded,
        Err(err) => {
            tracing::warn!("cannot check {}: {err}", path.display());
            false
        }
    }
}

/// Translate `config` and render the profile body (without the banner).
pub fn render_profile(config: &dyn ToolchainReader) -> Result<String, SyncError> {
    Ok(translator::translate(config)?.to_string())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of regenerating one configuration's profile.
#[derive(Debug)]
pub struct ConfigurationOutcome {
    pub configuration: ConfigurationId,
    pub result: Result<WriteResult, SyncError>,
}

/// Per-configuration results of a project regeneration.
#[derive(Debug)]
pub struct ProfileReport {
    pub project: String,
    pub opted_in: bool,
    pub outcomes: Vec<ConfigurationOutcome>,
}

impl ProfileReport {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(WriteResult::Written { .. })))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ConfigurationId, &SyncError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.configuration, e)))
    }
}

// ---------------------------------------------------------------------------
// Regeneration
// ---------------------------------------------------------------------------

/// Regenerate every configuration's profile.
///
/// A failing configuration is recorded in the report and does not stop its
/// siblings. Projects without a declaration file are skipped.
pub fn regenerate_project<P: ProjectModel + ?Sized>(project: &P, dry_run: bool) -> ProfileReport {
    let opted_in = is_opted_in(project.directory());
    let mut report = ProfileReport {
        project: project.unique_name().to_string(),
        opted_in,
        outcomes: Vec::new(),
    };
    if !opted_in {
        tracing::debug!("{} has no {}; skipping profiles", report.project, requirements::DECLARATION_FILE);
        return report;
    }

    for id in project.configuration_ids() {
        let result = write_profile(project, &id, dry_run);
        if let Err(err) = &result {
            tracing::warn!("{} [{id}]: {err}", report.project);
        }
        report.outcomes.push(ConfigurationOutcome {
            configuration: id,
            result,
        });
    }
    report
}

/// Regenerate one configuration's profile. `Ok(None)` when the project has
/// not opted in.
pub fn regenerate_configuration<P: ProjectModel + ?Sized>(
    project: &P,
    id: &ConfigurationId,
    dry_run: bool,
) -> Result<Option<WriteResult>, SyncError> {
    if !is_opted_in(project.directory()) {
        return Ok(None);
    }
    write_profile(project, id, dry_run).map(Some)
}

fn write_profile<P: ProjectModel + ?Sized>(
    project: &P,
    id: &ConfigurationId,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let config = project
        .toolchain(id)
        .ok_or_else(|| SyncError::ProjectModelUnavailable {
            project: project.unique_name().to_string(),
            detail: format!("no configuration {id}"),
        })?;
    let body = render_profile(config)?;
    let dir = project.directory();
    let path = profile_path(dir, id);

    // The marker goes down before the profile so a failed touch never leaves
    // an updated profile without a pending install.
    let planned = guard::write_if_permitted(&path, &body, true)?;
    if dry_run || !matches!(planned, WriteResult::WouldWrite { .. }) {
        return Ok(planned);
    }
    touch_marker(dir)?;
    guard::write_if_permitted(&path, &body, false)
}

fn touch_marker(project_dir: &Path) -> Result<(), SyncError> {
    let dir = profile_dir(project_dir);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    let path = marker_path(project_dir);
    std::fs::write(&path, b"").map_err(|e| io_err(&path, e))
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// On-disk state of one configuration's profile relative to what would be
/// generated now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileState {
    Current,
    Stale,
    Missing,
    UserOwned,
    Error(String),
}

impl ProfileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileState::Current => "current",
            ProfileState::Stale => "stale",
            ProfileState::Missing => "missing",
            ProfileState::UserOwned => "user-owned",
            ProfileState::Error(_) => "error",
        }
    }
}

/// Compare the profile on disk with a fresh translation. Never writes.
pub fn inspect_configuration<P: ProjectModel + ?Sized>(
    project: &P,
    id: &ConfigurationId,
) -> ProfileState {
    let Some(config) = project.toolchain(id) else {
        return ProfileState::Error(format!("no configuration {id}"));
    };
    let body = match render_profile(config) {
        Ok(body) => body,
        Err(err) => return ProfileState::Error(err.to_string()),
    };

    let path = profile_path(project.directory(), id);
    match std::fs::read_to_string(&path) {
        Ok(existing) => {
            let existing = guard::normalize_line_endings(&existing);
            if !guard::has_banner(&existing) {
                ProfileState::UserOwned
            } else if existing == guard::compose(&body) {
                ProfileState::Current
            } else {
                ProfileState::Stale
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => ProfileState::Missing,
        Err(err) => ProfileState::Error(io_err(&path, err).to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
