//! Init command: create the state document.

use crate::cli::InitArgs;
use crate::commands::utils;
use crate::config::{AppConfig, ConfigOverrides};
use crate::error::Result;
use crate::ui;

/// Execute the init command.
///
/// Creates the state document with defaults, or reports on the existing one.
/// A corrupt existing file is left untouched and reported as a warning.
pub async fn execute(_args: InitArgs, overrides: ConfigOverrides) -> Result<()> {
    let config = AppConfig::load(&overrides)?;
    let existed = config.state_path.exists();

    let store = utils::open_store(&config)?;

    if existed {
        ui::info(&format!(
            "State file already exists: {} ({} sources)",
            config.state_path.display(),
            store.sources().len()
        ));
    } else {
        ui::success(&format!("Created {}", config.state_path.display()));
    }
    ui::info("Run 'streamgrid start' to open the dashboard");
    Ok(())
}
