//! Error handling for the Streamgrid CLI.
//!
//! Commands return [`CliError`]; `main` turns it into a miette report. HTTP
//! handlers use [`ApiError`], which renders as `{"error": "..."}` with a
//! status code derived from the failure class.
//!
//! # Example
//!
//! ```rust,no_run
//! use streamgrid_cli::error::{Result, ResultExt};
//!
//! fn bind(port: u16) -> Result<std::net::TcpListener> {
//!     std::net::TcpListener::bind(("127.0.0.1", port)).with_hint("Try --port <PORT>")
//! }
//! ```

mod report;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use streamgrid_core::StoreError;
use thiserror::Error;
use tokio::task::JoinError;

pub use report::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The state document could not be read, written or updated
    #[error("State error: {0}")]
    Store(#[from] StoreError),

    /// I/O errors from file system or socket operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be parsed or merged
    #[error("Failed to load configuration: {0}\n\nHint: Check streamgrid.toml syntax and STREAMGRID_* environment variables")]
    Load(String),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Append a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }
}

/// Error returned by REST handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(err.to_string())
        }
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::internal(format!("store task failed: {err}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "request failed: {}", self.message);
        } else {
            tracing::debug!(status = %self.status, "request rejected: {}", self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use streamgrid_core::ResolveError;

    #[test]
    fn test_config_error_has_hint() {
        let err = ConfigError::InvalidValue {
            field: "host".to_string(),
            value: "\"\"".to_string(),
            hint: "Use an IP address such as 127.0.0.1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid value for 'host'"));
        assert!(msg.contains("Hint: Use an IP address"));
    }

    #[test]
    fn test_cli_error_from_store_error() {
        let cli_err: CliError = StoreError::UnknownSource("youtube:x".into()).into();
        assert!(matches!(cli_err, CliError::Store(_)));
        assert!(cli_err.to_string().contains("youtube:x"));
    }

    #[test]
    fn test_result_ext_with_hint() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address in use",
        ));
        let msg = result.with_hint("Try --port").unwrap_err().to_string();
        assert!(msg.starts_with("I/O error: address in use"));
        assert!(msg.ends_with("Hint: Try --port"));
    }

    #[test]
    fn test_api_error_status_follows_error_class() {
        let client: ApiError = StoreError::Resolve(ResolveError::Empty).into();
        assert_eq!(client.status(), StatusCode::BAD_REQUEST);
        assert_eq!(client.message(), "empty URL");

        let server: ApiError = StoreError::Persist {
            path: PathBuf::from("/state.json"),
            source: std::io::Error::other("disk full"),
        }
        .into();
        assert_eq!(server.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
