//! Miette diagnostic conversion for CLI errors.

use miette::Report;
use streamgrid_core::StoreError;

use crate::error::CliError;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => miette::miette!("{}", e),
        CliError::Store(e) => store_error_to_miette(e),
        _ => miette::miette!("{}", err),
    }
}

fn store_error_to_miette(err: StoreError) -> Report {
    match err {
        StoreError::Persist { path, source } | StoreError::CreateDir { path, source } => {
            miette::miette!(
                "Cannot write state file {}: {}\n\nHint: Check permissions or pass --state <PATH>",
                path.display(),
                source
            )
        }
        StoreError::Resolve(e) => miette::miette!(
            "{}\n\nHint: Supported: YouTube, Twitch, Niconico, Vimeo, HLS (.m3u8) and direct http(s) media URLs",
            e
        ),
        other => miette::miette!("{}", other),
    }
}
