//! Add command: register a stream from the shell.

use crate::cli::AddArgs;
use crate::commands::utils;
use crate::config::{AppConfig, ConfigOverrides};
use crate::error::Result;
use crate::ui;

/// Execute the add command.
///
/// Writes through a store opened on the same file as the server; a running
/// server sees the edit through its file watcher. The new id is printed to
/// stdout.
pub async fn execute(args: AddArgs, overrides: ConfigOverrides) -> Result<()> {
    let config = AppConfig::load(&overrides)?;
    let store = utils::open_store(&config)?;

    let source = store.add_url(&args.url)?;

    ui::success(&format!("Added {} source", source.platform));
    println!("{}", source.id);
    Ok(())
}
