use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the daemon runtime, protocol and owner thread.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("project model error: {0}")]
    Model(#[from] rigging_core::ModelError),

    #[error("sync error: {0}")]
    Sync(#[from] rigging_sync::SyncError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("daemon protocol error: {0}")]
    Protocol(String),

    #[error("daemon is not running (socket missing: {socket})")]
    DaemonNotRunning { socket: PathBuf },

    /// A blocking call was made from the owner thread itself.
    #[error("re-entrant call on owner thread '{0}'")]
    ReentrantCall(String),

    #[error("event handler panicked: {0}")]
    HandlerPanicked(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
