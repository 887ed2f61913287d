//! HTTP server: REST endpoints, the WebSocket feed and the JSON-RPC endpoint,
//! all over one shared [`DocumentStore`](streamgrid_core::DocumentStore).

pub mod protocol;
pub mod rest;
pub mod rpc;
mod state;
pub mod ws;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{CliError, Result};

pub use state::{AppState, ClientId};

/// Build the router with every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(rest::health))
        .route("/api/state", get(rest::get_state))
        .route("/api/sources", get(rest::get_sources))
        .route("/api/add", post(rest::add))
        .route("/api/remove", post(rest::remove))
        .route("/api/layout", post(rest::layout))
        .route("/api/audio", post(rest::audio))
        .route("/api/window", post(rest::window))
        .route("/api/reorder", post(rest::reorder))
        .route("/api/text-overlay", post(rest::text_overlay))
        .route("/api/show-ids", post(rest::show_ids))
        .route("/api/youtube-nocookie", post(rest::youtube_no_cookie))
        .route("/api/hide-cursor", post(rest::hide_cursor))
        .route("/ws", get(ws::handle_ws))
        .route("/mcp", post(rpc::handle_rpc))
        .layer(
            // Dashboard pages may be served from any origin
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until [`AppState::begin_shutdown`] is called.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let shutdown = state.shutdown_signal();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}
