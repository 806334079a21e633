//! Error types for rigging-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from reading or saving the project model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.rigging/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A manifest file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    /// The solution does not list a project with this unique name.
    #[error("project '{name}' is not part of the solution")]
    ProjectNotFound { name: String },

    /// The project has no configuration with this identity.
    #[error("project '{project}' has no configuration '{configuration}'")]
    ConfigurationNotFound {
        project: String,
        configuration: String,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ModelError {
    ModelError::Io {
        path: path.into(),
        source,
    }
}
