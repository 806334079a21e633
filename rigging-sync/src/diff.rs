//! Dry-run unified diff support for `rigging diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use rigging_core::{ConfigurationId, ProjectModel};

use crate::{
    error::io_err,
    guard::{self, normalize_line_endings},
    profiles, SyncError,
};

/// What regeneration would do to one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileChange {
    /// Profile would change; carries the unified diff.
    Changed { unified_diff: String },
    /// Existing profile is user-owned and would be skipped.
    UserOwned,
    /// Configuration cannot be translated.
    Failed { reason: String },
}

/// A single profile diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDiff {
    pub configuration: ConfigurationId,
    pub path: PathBuf,
    pub change: ProfileChange,
}

/// Diff result for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffProjectResult {
    pub project: String,
    pub opted_in: bool,
    pub diffs: Vec<ProfileDiff>,
}

/// Render what regeneration would write and compare it to on-disk profiles.
///
/// No files are written. Up-to-date profiles are omitted.
pub fn diff_project<P: ProjectModel + ?Sized>(project: &P) -> Result<DiffProjectResult, SyncError> {
    let dir = project.directory();
    let mut result = DiffProjectResult {
        project: project.unique_name().to_string(),
        opted_in: profiles::is_opted_in(dir),
        diffs: Vec::new(),
    };
    if !result.opted_in {
        return Ok(result);
    }

    for id in project.configuration_ids() {
        let path = profiles::profile_path(dir, &id);
        let rendered = match project.toolchain(&id).map(profiles::render_profile) {
            Some(Ok(body)) => guard::compose(&body),
            Some(Err(err)) => {
                result.diffs.push(ProfileDiff {
                    configuration: id,
                    path,
                    change: ProfileChange::Failed {
                        reason: err.to_string(),
                    },
                });
                continue;
            }
            None => continue,
        };

        let existing = read_existing(&path)?;
        if existing.as_deref() == Some(rendered.as_str()) {
            continue;
        }
        let change = if existing.as_deref().is_some_and(|e| !guard::has_banner(e)) {
            ProfileChange::UserOwned
        } else {
            let existing = existing.unwrap_or_default();
            let relative = path.strip_prefix(dir).unwrap_or(path.as_path());
            let old_header = format!("a/{}", relative.display());
            let new_header = format!("b/{}", relative.display());
            let unified_diff = TextDiff::from_lines(&existing, &rendered)
                .unified_diff()
                .header(&old_header, &new_header)
                .context_radius(3)
                .to_string();
            ProfileChange::Changed { unified_diff }
        };
        result.diffs.push(ProfileDiff {
            configuration: id,
            path,
            change,
        });
    }
    Ok(result)
}

/// Normalised content of `path`, `None` when the file does not exist.
fn read_existing(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(normalize_line_endings(&content))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) if err.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
        Err(err) => Err(io_err(path, err)),
    }
}
