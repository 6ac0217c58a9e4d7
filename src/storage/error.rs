//! Storage error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised inside the storage subsystem.
///
/// None of these cross the `McpConfigStorage` boundary: they are logged where
/// they occur and the caller sees a successful (possibly degraded) result.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file does not exist yet.
    #[error("config file {} not found", .path.display())]
    NotFound { path: PathBuf },

    /// Any other filesystem failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content is not valid JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Content is valid JSON but not an object of named configs.
    #[error("expected a JSON object of named configs, found {found}")]
    NotAnObject { found: &'static str },

    /// The filesystem watch could not be established.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl StorageError {
    /// Map an `io::Error` for `path`, splitting out the not-found case.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound { path }
        } else {
            StorageError::Io { path, source }
        }
    }

    /// Whether the content itself was unusable (as opposed to unreadable).
    pub fn is_malformed(&self) -> bool {
        matches!(self, StorageError::Parse(_) | StorageError::NotAnObject { .. })
    }
}
