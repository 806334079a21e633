//! Error types for rigging-sync.

use std::path::PathBuf;

use thiserror::Error;

use rigging_core::ModelError;

/// All errors that can arise from sync operations.
///
/// Writing to a user-owned file is not an error: it is reported as
/// [`crate::WriteResult::NotGuarded`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// A toolchain value has no known package-manager mapping.
    #[error("unsupported {field} value '{value}'")]
    UnsupportedValue { field: &'static str, value: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The host could not resolve the project or configuration an operation targets.
    #[error("project model unavailable for '{project}': {detail}")]
    ProjectModelUnavailable { project: String, detail: String },

    /// An error from the project model.
    #[error("project model error: {0}")]
    Model(#[from] ModelError),

    /// YAML serialization error (dependency declaration file).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn unsupported(field: &'static str, value: impl Into<String>) -> SyncError {
    SyncError::UnsupportedValue {
        field,
        value: value.into(),
    }
}
