//! Build integration injector.
//!
//! Wires a configuration to the package manager in two ways:
//! - imports [`PROPS_IMPORT_PATH`] as a property sheet;
//! - prepends an `install` invocation to the pre-build command.
//!
//! Both checks are idempotent. Injection only mutates the in-memory project;
//! [`ensure_wired`] saves once per batch when anything changed.

use rigging_core::{ConfigurationId, ProjectModel};

use crate::error::SyncError;
use crate::profiles::PROFILE_DIR;
use crate::scaffold::{self, PROPS_IMPORT_PATH};

/// Substring whose presence in a pre-build command means it is already wired.
pub const INVOCATION_MARKER: &str = "conan";

/// Pre-build invocation for one configuration.
pub fn install_command(executable: &str, id: &ConfigurationId) -> String {
    format!(
        "\"{executable}\" install . -pr:h={PROFILE_DIR}/{} --build=missing",
        id.profile_name()
    )
}

/// What injection changed (or would change) in one configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionOutcome {
    pub property_sheet_added: bool,
    pub pre_build_added: bool,
}

impl InjectionOutcome {
    pub fn changed(&self) -> bool {
        self.property_sheet_added || self.pre_build_added
    }
}

fn same_sheet(a: &str, b: &str) -> bool {
    let normalize = |s: &str| s.trim().replace('\\', "/").to_ascii_lowercase();
    normalize(a) == normalize(b)
}

fn missing(project: &str, id: &ConfigurationId) -> SyncError {
    SyncError::ProjectModelUnavailable {
        project: project.to_string(),
        detail: format!("no configuration {id}"),
    }
}

/// Read-only: the changes [`inject_configuration`] would make.
pub fn plan<P: ProjectModel + ?Sized>(
    project: &P,
    id: &ConfigurationId,
) -> Result<InjectionOutcome, SyncError> {
    let sheets = project
        .property_sheets(id)
        .ok_or_else(|| missing(project.unique_name(), id))?;
    let pre_build = project
        .pre_build_command(id)
        .ok_or_else(|| missing(project.unique_name(), id))?;
    Ok(InjectionOutcome {
        property_sheet_added: !sheets.iter().any(|s| same_sheet(s, PROPS_IMPORT_PATH)),
        pre_build_added: !pre_build.contains(INVOCATION_MARKER),
    })
}

/// True when the configuration already imports the sheet and invokes the
/// package manager before building.
pub fn is_wired<P: ProjectModel + ?Sized>(project: &P, id: &ConfigurationId) -> bool {
    plan(project, id).is_ok_and(|outcome| !outcome.changed())
}

/// Inject one configuration in memory. Does not save.
pub fn inject_configuration<P: ProjectModel + ?Sized>(
    project: &mut P,
    id: &ConfigurationId,
    executable: &str,
) -> Result<InjectionOutcome, SyncError> {
    let outcome = plan(&*project, id)?;

    if outcome.property_sheet_added {
        project.add_property_sheet(id, PROPS_IMPORT_PATH)?;
    }
    if outcome.pre_build_added {
        let command = install_command(executable, id);
        let current = project.pre_build_command(id).unwrap_or_default();
        let text = if current.trim().is_empty() {
            command
        } else {
            format!("{command}\n{current}")
        };
        project.set_pre_build_command(id, &text)?;
    }
    Ok(outcome)
}

/// Per-configuration injection results for one project.
#[derive(Debug)]
pub struct InjectionReport {
    pub project: String,
    pub placeholder_created: bool,
    pub outcomes: Vec<(ConfigurationId, Result<InjectionOutcome, SyncError>)>,
    pub saved: bool,
}

impl InjectionReport {
    pub fn changed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, r)| r.as_ref().is_ok_and(InjectionOutcome::changed))
    }
}

/// Wire every configuration in `ids`, then save the project at most once.
///
/// The placeholder property sheet is created first so the import resolves
/// before the first install. With `dry_run` nothing is mutated or saved;
/// outcomes describe what would change.
pub fn ensure_wired<P: ProjectModel + ?Sized>(
    project: &mut P,
    ids: &[ConfigurationId],
    executable: &str,
    dry_run: bool,
) -> Result<InjectionReport, SyncError> {
    let placeholder_created = scaffold::ensure_props_placeholder(project.directory(), dry_run)?;
    let mut report = InjectionReport {
        project: project.unique_name().to_string(),
        placeholder_created,
        outcomes: Vec::with_capacity(ids.len()),
        saved: false,
    };

    for id in ids {
        let result = if dry_run {
            plan(&*project, id)
        } else {
            inject_configuration(project, id, executable)
        };
        if let Err(err) = &result {
            tracing::warn!("{} [{id}]: injection failed: {err}", report.project);
        }
        report.outcomes.push((id.clone(), result));
    }

    if report.changed() && !dry_run {
        project.save()?;
        report.saved = true;
        tracing::info!("saved {}", report.project);
    }
    Ok(report)
}
