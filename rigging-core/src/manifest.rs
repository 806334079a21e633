//! YAML-backed host implementation.
//!
//! # Storage layout
//!
//! ```text
//! <solution_dir>/
//!   solution.yaml            (lists project manifests, relative paths)
//!   App/
//!     App.project.yaml       (one manifest per project)
//! ```
//!
//! The relative path listed in `solution.yaml` is the project's unique name,
//! the same string build lifecycle events carry.
//!
//! Projects are read from disk on every [`ProjectHost::open_project`] call, so
//! configuration enumeration always reflects the current manifest.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ModelError};
use crate::model::{ProjectHost, ProjectModel};
use crate::toolchain::ToolchainReader;
use crate::types::{BuildConfiguration, ConfigurationId, ProjectManifest, SolutionManifest};

/// Default solution manifest file name.
pub const SOLUTION_FILE: &str = "solution.yaml";

// ---------------------------------------------------------------------------
// 1. Load / save helpers
// ---------------------------------------------------------------------------

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    if !path.exists() {
        return Err(ModelError::ManifestNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ModelError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize → `<file>.tmp` sibling → `rename`.
fn write_yaml_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
    }
    let yaml = serde_yaml::to_string(value)?;
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Atomically write a solution manifest.
pub fn save_solution_at(path: &Path, manifest: &SolutionManifest) -> Result<(), ModelError> {
    write_yaml_atomic(path, manifest)
}

/// Atomically write a project manifest.
pub fn save_project_at(path: &Path, manifest: &ProjectManifest) -> Result<(), ModelError> {
    write_yaml_atomic(path, manifest)
}

// ---------------------------------------------------------------------------
// 2. Project
// ---------------------------------------------------------------------------

/// A project loaded from its manifest file.
#[derive(Debug, Clone)]
pub struct ManifestProject {
    unique_name: String,
    path: PathBuf,
    directory: PathBuf,
    pub manifest: ProjectManifest,
}

impl ManifestProject {
    /// Load the manifest at `path`, registering it under `unique_name`.
    pub fn load(path: &Path, unique_name: impl Into<String>) -> Result<Self, ModelError> {
        let manifest: ProjectManifest = read_yaml(path)?;
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            unique_name: unique_name.into(),
            path: path.to_path_buf(),
            directory,
            manifest,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn find(&self, id: &ConfigurationId) -> Option<&BuildConfiguration> {
        self.manifest
            .configurations
            .iter()
            .find(|c| c.configuration == id.configuration && c.platform == id.platform)
    }

    fn find_mut(&mut self, id: &ConfigurationId) -> Result<&mut BuildConfiguration, ModelError> {
        let project = self.unique_name.clone();
        self.manifest
            .configurations
            .iter_mut()
            .find(|c| c.configuration == id.configuration && c.platform == id.platform)
            .ok_or_else(|| ModelError::ConfigurationNotFound {
                project,
                configuration: id.to_string(),
            })
    }
}

impl ProjectModel for ManifestProject {
    fn unique_name(&self) -> &str {
        &self.unique_name
    }

    fn directory(&self) -> &Path {
        &self.directory
    }

    fn configuration_ids(&self) -> Vec<ConfigurationId> {
        self.manifest
            .configurations
            .iter()
            .map(BuildConfiguration::id)
            .collect()
    }

    fn toolchain(&self, id: &ConfigurationId) -> Option<&dyn ToolchainReader> {
        self.find(id).map(|c| c as &dyn ToolchainReader)
    }

    fn property_sheets(&self, id: &ConfigurationId) -> Option<&[String]> {
        self.find(id).map(|c| c.property_sheets.as_slice())
    }

    fn add_property_sheet(&mut self, id: &ConfigurationId, path: &str) -> Result<(), ModelError> {
        self.find_mut(id)?.property_sheets.push(path.to_string());
        Ok(())
    }

    fn pre_build_command(&self, id: &ConfigurationId) -> Option<&str> {
        self.find(id).map(|c| c.pre_build_command.as_str())
    }

    fn set_pre_build_command(
        &mut self,
        id: &ConfigurationId,
        text: &str,
    ) -> Result<(), ModelError> {
        self.find_mut(id)?.pre_build_command = text.to_string();
        Ok(())
    }

    fn save(&mut self) -> Result<(), ModelError> {
        save_project_at(&self.path, &self.manifest)
    }
}

// ---------------------------------------------------------------------------
// 3. Solution
// ---------------------------------------------------------------------------

/// A solution manifest and the directory its project paths are relative to.
#[derive(Debug, Clone)]
pub struct ManifestSolution {
    path: PathBuf,
    root: PathBuf,
}

impl ManifestSolution {
    /// Open the solution manifest at `path`. The file must exist; its contents
    /// are re-read on every query.
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the solution manifest.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> Result<SolutionManifest, ModelError> {
        read_yaml(&self.path)
    }

    /// Absolute path of a project manifest listed in the solution.
    pub fn project_path(&self, unique_name: &str) -> Result<PathBuf, ModelError> {
        self.manifest()?
            .projects
            .iter()
            .find(|p| unique_name_of(p) == unique_name)
            .map(|p| self.root.join(p))
            .ok_or_else(|| ModelError::ProjectNotFound {
                name: unique_name.to_string(),
            })
    }
}

impl ProjectHost for ManifestSolution {
    type Project = ManifestProject;

    fn project_names(&self) -> Result<Vec<String>, ModelError> {
        Ok(self
            .manifest()?
            .projects
            .iter()
            .map(|p| unique_name_of(p))
            .collect())
    }

    fn open_project(&self, unique_name: &str) -> Result<ManifestProject, ModelError> {
        let path = self.project_path(unique_name)?;
        ManifestProject::load(&path, unique_name)
    }
}

/// Unique names always use `/` separators so events from any platform match.
fn unique_name_of(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
