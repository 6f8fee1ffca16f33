//! Error types for mirra

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for mirror operations
#[derive(Debug, Error)]
pub enum MirraError {
    /// Source root missing at startup or vanished mid-pass
    #[error("Source directory not found: {path}")]
    SourceMissing { path: PathBuf },

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic read/write/copy/delete failure, carrying the failing path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration (fatal at startup only)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MirraError {
    /// Wrap an `io::Error` with the path that raised it.
    ///
    /// Permission failures are lifted into their own variant so callers can
    /// classify without digging through the source error.
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        let path = path.into();
        if error.kind() == ErrorKind::PermissionDenied {
            MirraError::PermissionDenied { path }
        } else {
            MirraError::Io { path, source: error }
        }
    }

    /// Fatal errors abort the pass (or startup); everything else is a
    /// per-entry failure the caller reports and skips past.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MirraError::SourceMissing { .. } | MirraError::Config(_)
        )
    }

    /// Check if this error is related to permissions
    pub fn is_permission_error(&self) -> bool {
        matches!(self, MirraError::PermissionDenied { .. })
    }
}
