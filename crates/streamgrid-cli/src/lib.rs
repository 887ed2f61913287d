//! Streamgrid CLI - local dashboard server for arranging and syncing video
//! embeds.
//!
//! This crate wires the state core from `streamgrid-core` to the outside
//! world: a command line, layered configuration, and an HTTP server that
//! exposes the document over REST, WebSocket and JSON-RPC.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing with clap
//! - [`commands`] - One module per subcommand
//! - [`config`] - Layered configuration (defaults, file, environment, flags)
//! - [`error`] - Error types with actionable messages
//! - [`logger`] - Structured logging with tracing
//! - [`server`] - axum router and the REST / WebSocket / JSON-RPC adapters
//! - [`ui`] - Terminal status messages
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use streamgrid_cli::server::{self, AppState};
//! use streamgrid_core::DocumentStore;
//!
//! # async fn run() -> streamgrid_cli::Result<()> {
//! let store = DocumentStore::initialize("/tmp/streamgrid/state.json")?;
//! let app = server::router(AppState::new(Arc::clone(&store)));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3939").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod server;
pub mod ui;

pub use config::AppConfig;
pub use error::{CliError, ConfigError, Result, ResultExt};
