//! Logging setup for the Streamgrid CLI.
//!
//! Library and server code log through `tracing` with structured fields
//! (`source_id`, `path`, `client`, `method`). This module installs the
//! subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use streamgrid_cli::{logger::init_logger, ui};
//! use tracing::info;
//!
//! ui::init_colors(false);
//! init_logger(false, false);
//! info!(port = 3939, "server starting");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "streamgrid=debug,streamgrid_core=debug,streamgrid_cli=debug";
const QUIET_FILTER: &str = "streamgrid=error,streamgrid_core=error,streamgrid_cli=error";
const DEFAULT_FILTER: &str = "streamgrid=info,streamgrid_core=info,streamgrid_cli=info";

/// Initialize the tracing subscriber.
///
/// Call once at startup, after [`ui::init_colors`](crate::ui::init_colors)
/// and before anything logs. Level selection, in order:
/// `--verbose` (debug for streamgrid crates), `--quiet` (errors only),
/// `RUST_LOG`, then info.
pub fn init_logger(verbose: bool, quiet: bool) {
    let filter = filter_for(verbose, quiet);

    // stderr, so stdout stays clean for `list --json` and `add`
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(crate::ui::colors_enabled())
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
