//! Dependency declaration store (`conandata.yml`).
//!
//! The file is a guarded YAML document with a single `requirements` sequence.
//! Every mutation re-serializes the whole list, so two stores holding the same
//! requirements produce identical bytes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::guard::{self, WriteResult};

/// Dependency declaration file name, relative to the project directory.
pub const DECLARATION_FILE: &str = "conandata.yml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Requirements {
    #[serde(default)]
    requirements: Option<Vec<String>>,
}

/// Outcome of a requirement mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementChange {
    Added,
    Removed,
    /// Already present (add) or already absent (remove).
    Unchanged,
    /// The file is user-owned; nothing was written.
    NotGuarded,
}

/// `<project_dir>/conandata.yml`
pub fn declaration_path(project_dir: &Path) -> PathBuf {
    project_dir.join(DECLARATION_FILE)
}

/// Requirements in file order. Missing or unparsable files yield an empty list.
pub fn list_requirements(project_dir: &Path) -> Vec<String> {
    let path = declaration_path(project_dir);
    let body = match guard::read_body(&path) {
        Ok(Some(body)) => body,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!("cannot read {}: {err}", path.display());
            return Vec::new();
        }
    };
    match serde_yaml::from_str::<Option<Requirements>>(&body) {
        Ok(parsed) => parsed
            .and_then(|r| r.requirements)
            .unwrap_or_default(),
        Err(err) => {
            tracing::warn!("ignoring malformed {}: {err}", path.display());
            Vec::new()
        }
    }
}

/// Append `id` unless it is already declared.
pub fn add_requirement(project_dir: &Path, id: &str) -> Result<RequirementChange, SyncError> {
    let path = declaration_path(project_dir);
    if path.exists() && !guard::is_guarded(&path)? {
        return Ok(RequirementChange::NotGuarded);
    }

    let mut requirements = list_requirements(project_dir);
    if requirements.iter().any(|r| r == id) {
        return Ok(RequirementChange::Unchanged);
    }
    requirements.push(id.to_string());

    match write_requirements(&path, &requirements)? {
        WriteResult::NotGuarded { .. } => Ok(RequirementChange::NotGuarded),
        _ => Ok(RequirementChange::Added),
    }
}

/// Remove `id` if it is declared.
pub fn remove_requirement(project_dir: &Path, id: &str) -> Result<RequirementChange, SyncError> {
    let path = declaration_path(project_dir);
    if path.exists() && !guard::is_guarded(&path)? {
        return Ok(RequirementChange::NotGuarded);
    }

    let requirements = list_requirements(project_dir);
    if !requirements.iter().any(|r| r == id) {
        return Ok(RequirementChange::Unchanged);
    }
    let remaining: Vec<String> = requirements.into_iter().filter(|r| r != id).collect();

    match write_requirements(&path, &remaining)? {
        WriteResult::NotGuarded { .. } => Ok(RequirementChange::NotGuarded),
        _ => Ok(RequirementChange::Removed),
    }
}

/// YAML body for a requirement list.
pub fn render_body(requirements: &[String]) -> Result<String, SyncError> {
    let doc = Requirements {
        requirements: Some(requirements.to_vec()),
    };
    Ok(serde_yaml::to_string(&doc)?)
}

fn write_requirements(path: &Path, requirements: &[String]) -> Result<WriteResult, SyncError> {
    let body = render_body(requirements)?;
    guard::write_if_permitted(path, &body, false)
}
