//! Whole-project sync pipeline.
//!
//! For each project in scope:
//! 1. Regenerate every configuration's profile.
//! 2. If the project opted in, wire every configuration and save once.
//!
//! A failing project is reported and does not stop the others.

use rigging_core::{ProjectHost, ProjectModel, Settings};

use crate::error::SyncError;
use crate::guard::WriteResult;
use crate::injector::{self, InjectionReport};
use crate::profiles::{self, ProfileReport};
use crate::scaffold;

/// Which projects a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    All,
    Project(String),
}

/// Result of syncing one project.
#[derive(Debug)]
pub struct ProjectRun {
    pub profiles: ProfileReport,
    /// `None` when the project has not opted in.
    pub injection: Option<InjectionReport>,
}

impl ProjectRun {
    /// Number of per-configuration failures across both stages.
    pub fn failure_count(&self) -> usize {
        let injection = self
            .injection
            .as_ref()
            .map(|r| r.outcomes.iter().filter(|(_, r)| r.is_err()).count())
            .unwrap_or(0);
        self.profiles.failures().count() + injection
    }
}

/// One project's entry in a run report.
#[derive(Debug)]
pub struct ProjectSyncResult {
    pub project: String,
    pub outcome: Result<ProjectRun, SyncError>,
}

/// Sync every project in `scope`.
///
/// Fails as a whole only when the project list cannot be read or a named
/// project does not exist.
pub fn run<H: ProjectHost>(
    host: &H,
    scope: &SyncScope,
    settings: &Settings,
    dry_run: bool,
) -> Result<Vec<ProjectSyncResult>, SyncError> {
    let names = match scope {
        SyncScope::All => host.project_names()?,
        SyncScope::Project(name) => {
            if !host.project_names()?.iter().any(|n| n == name) {
                return Err(SyncError::ProjectModelUnavailable {
                    project: name.clone(),
                    detail: "not part of the solution".to_string(),
                });
            }
            vec![name.clone()]
        }
    };

    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let outcome = host
            .open_project(&name)
            .map_err(SyncError::from)
            .and_then(|mut project| sync_project(&mut project, settings, dry_run));
        match &outcome {
            Ok(run) if run.failure_count() > 0 => {
                tracing::warn!("{name}: synced with {} failure(s)", run.failure_count());
            }
            Ok(_) => tracing::debug!("{name}: synced"),
            Err(err) => tracing::error!("{name}: {err}"),
        }
        results.push(ProjectSyncResult {
            project: name,
            outcome,
        });
    }
    Ok(results)
}

/// Regenerate profiles and, for opted-in projects, wire every configuration.
pub fn sync_project<P: ProjectModel + ?Sized>(
    project: &mut P,
    settings: &Settings,
    dry_run: bool,
) -> Result<ProjectRun, SyncError> {
    let profiles = profiles::regenerate_project(&*project, dry_run);
    let injection = if profiles.opted_in {
        let ids = project.configuration_ids();
        Some(injector::ensure_wired(
            project,
            &ids,
            &settings.conan_executable,
            dry_run,
        )?)
    } else {
        None
    };
    Ok(ProjectRun {
        profiles,
        injection,
    })
}

/// Result of opting a project in.
#[derive(Debug)]
pub struct InitReport {
    /// `None` when a declaration file already existed.
    pub conandata: Option<WriteResult>,
    pub conanfile: WriteResult,
    pub run: ProjectRun,
}

/// Opt a project in: declaration file, recipe, then a full sync.
pub fn init_project<H: ProjectHost>(
    host: &H,
    name: &str,
    settings: &Settings,
) -> Result<InitReport, SyncError> {
    let mut project = host.open_project(name)?;
    let dir = project.directory().to_path_buf();
    let conandata = scaffold::ensure_conandata(&dir)?;
    let conanfile = scaffold::ensure_conanfile(&dir)?;
    let run = sync_project(&mut project, settings, false)?;
    Ok(InitReport {
        conandata,
        conanfile,
        run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements;
    use crate::test_support::{config, MockProject};
    use tempfile::TempDir;

    #[test]
    fn project_without_declaration_gets_no_wiring() {
        let dir = TempDir::new().unwrap();
        let mut project = MockProject::new(dir.path(), vec![config("Debug", "x64", "v143", "MultiThreadedDLL")]);

        let run = sync_project(&mut project, &Settings::default(), false).unwrap();
        assert!(!run.profiles.opted_in);
        assert!(run.injection.is_none());
        assert_eq!(project.saves, 0);
    }

    #[test]
    fn opted_in_project_is_profiled_and_wired() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            requirements::declaration_path(dir.path()),
            crate::guard::compose("requirements: []\n"),
        )
        .unwrap();
        let mut project = MockProject::new(
            dir.path(),
            vec![
                config("Debug", "x64", "v143", "MultiThreadedDebugDLL"),
                config("Debug", "ARM", "v143", "MultiThreadedDebugDLL"),
            ],
        );

        let run = sync_project(&mut project, &Settings::default(), false).unwrap();
        assert_eq!(run.profiles.written(), 1);
        assert_eq!(run.failure_count(), 1, "ARM profile fails, wiring succeeds");
        assert_eq!(project.saves, 1);
        assert!(project
            .configuration_ids()
            .iter()
            .all(|id| injector::is_wired(&project, id)));
    }
}
