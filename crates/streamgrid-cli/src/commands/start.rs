//! Start command: the dashboard server.
//!
//! Opens the state document, watches it for external edits, serves the HTTP,
//! WebSocket and JSON-RPC endpoints, and shuts down cleanly on Ctrl+C.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::debug;

use crate::cli::StartArgs;
use crate::commands::utils;
use crate::config::{AppConfig, ConfigOverrides, PUBLIC_HOST};
use crate::error::{Result, ResultExt};
use crate::server::{self, AppState};
use crate::ui;

/// Execute the start command.
///
/// # Process Flow
///
/// 1. Merge command flags into the configuration
/// 2. Open the state document and start the file watcher
/// 3. Bind the listener and spawn the HTTP server
/// 4. Optionally open a browser
/// 5. Wait for Ctrl+C (or the server ending on its own), then drain
///    connections
pub async fn execute(args: StartArgs, mut overrides: ConfigOverrides) -> Result<()> {
    // Step 1: Configuration
    apply_flags(&args, &mut overrides);
    let mut config = AppConfig::load(&overrides)?;
    debug!(?config, "resolved configuration");

    // Step 2: Store and file watcher
    let store = utils::open_store(&config)?;
    let _watcher = store.watch_for_external_changes(Duration::from_millis(config.watch_debounce_ms))?;
    ui::info(&format!("State file: {}", store.path().display()));

    // Step 3: HTTP server in background
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_hint(format!(
            "Is another server using port {}? Try --port <PORT>",
            config.port
        ))?;
    // Port 0 asks the OS for a free port; report the real one
    config.port = listener.local_addr()?.port();

    if config.host == PUBLIC_HOST {
        ui::warning("Listening on all interfaces; anyone on your network can edit the dashboard");
    }
    ui::success(&format!("Dashboard running at {}", config.server_url()));

    let state = AppState::new(store);
    let server_state = state.clone();
    let mut server_handle = tokio::spawn(server::serve(listener, server_state));

    // Step 4: Browser
    if config.open {
        open_browser(&config.server_url());
    }

    // Step 5: Wait for shutdown
    ui::info("Press Ctrl+C to stop");

    tokio::select! {
        _ = signal::ctrl_c() => {
            ui::info("Shutting down...");
            state.begin_shutdown();
            match server_handle.await {
                Ok(result) => result?,
                Err(e) => ui::warning(&format!("Server task failed: {}", e)),
            }
        }

        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => ui::warning("Server stopped unexpectedly"),
                Ok(Err(e)) => return Err(e),
                Err(e) => ui::warning(&format!("Server task failed: {}", e)),
            }
        }
    }

    ui::success("Server stopped");
    Ok(())
}

fn apply_flags(args: &StartArgs, overrides: &mut ConfigOverrides) {
    if let Some(port) = args.port {
        overrides.port = Some(port);
    }
    if args.host {
        overrides.host = Some(PUBLIC_HOST.to_string());
    }
    if args.no_open {
        overrides.open = Some(false);
    }
}

fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {}", url)),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_args(port: Option<u16>, host: bool, no_open: bool) -> StartArgs {
        StartArgs {
            port,
            host,
            no_open,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut overrides = ConfigOverrides::default();
        apply_flags(&start_args(Some(8080), true, true), &mut overrides);

        assert_eq!(overrides.port, Some(8080));
        assert_eq!(overrides.host.as_deref(), Some(PUBLIC_HOST));
        assert_eq!(overrides.open, Some(false));
    }

    #[test]
    fn test_absent_flags_leave_config_alone() {
        let mut overrides = ConfigOverrides::default();
        apply_flags(&start_args(None, false, false), &mut overrides);

        assert_eq!(overrides.port, None);
        assert_eq!(overrides.host, None);
        assert_eq!(overrides.open, None);
    }
}
