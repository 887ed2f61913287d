//! Remove command.

use crate::cli::RemoveArgs;
use crate::commands::utils;
use crate::config::{AppConfig, ConfigOverrides};
use crate::error::Result;
use crate::ui;

/// Execute the remove command. An unknown id is a warning, not a failure.
pub async fn execute(args: RemoveArgs, overrides: ConfigOverrides) -> Result<()> {
    let config = AppConfig::load(&overrides)?;
    let store = utils::open_store(&config)?;

    if store.remove_source(&args.id)? {
        ui::success(&format!("Removed {}", args.id));
    } else {
        ui::warning(&format!(
            "No source with id '{}' (see 'streamgrid list')",
            args.id
        ));
    }
    Ok(())
}
