//! Error types for the document store and URL resolution.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// A URL that no stream provider recognises.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported stream URL: {0}")]
    Unrecognized(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    // Input errors: reported to the caller only, never broadcast
    #[error("unknown source id: {0}")]
    UnknownSource(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    // Persistence errors: the in-memory change is already applied
    #[error("failed to persist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create state directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl StoreError {
    /// True when the failure was caused by the request itself rather than the
    /// server (transports answer these with 400 / an RPC error).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnknownSource(_) | StoreError::InvalidValue { .. } | StoreError::Resolve(_)
        )
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
