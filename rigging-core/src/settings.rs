//! User settings persisted at `~/.rigging/config.yaml`.
//!
//! Same API pattern as the manifests: `load_at(home)` / `save_at(home)` take an
//! explicit home directory (used by tests), and the no-arg wrappers derive it
//! from `dirs::home_dir()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ModelError};

/// Executable used when no path has been configured.
pub const DEFAULT_CONAN_EXECUTABLE: &str = "conan";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Package manager executable invoked by the injected pre-build step.
    #[serde(default = "default_conan_executable")]
    pub conan_executable: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            conan_executable: default_conan_executable(),
        }
    }
}

impl Settings {
    /// Set the executable path. Empty values are ignored.
    pub fn set_conan_executable(&mut self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() {
            return false;
        }
        self.conan_executable = path.to_string();
        true
    }
}

fn default_conan_executable() -> String {
    DEFAULT_CONAN_EXECUTABLE.to_string()
}

/// `<home>/.rigging/config.yaml`. Pure, no I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    home.join(".rigging").join("config.yaml")
}

/// Load settings, falling back to defaults if the file does not exist.
pub fn load_at(home: &Path) -> Result<Settings, ModelError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ModelError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, ModelError> {
    load_at(&home()?)
}

/// Atomically save settings (`.tmp` + rename).
pub fn save_at(home: &Path, settings: &Settings) -> Result<(), ModelError> {
    let path = settings_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid settings path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let yaml = serde_yaml::to_string(settings)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(settings: &Settings) -> Result<(), ModelError> {
    save_at(&home()?, settings)
}

fn home() -> Result<PathBuf, ModelError> {
    dirs::home_dir().ok_or(ModelError::HomeNotFound)
}
