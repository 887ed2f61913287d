use std::sync::Arc;

use streamgrid_core::DocumentStore;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::Result;
use crate::ui;

/// Open the state document named by `config`, surfacing load problems.
pub(crate) fn open_store(config: &AppConfig) -> Result<Arc<DocumentStore>> {
    debug!(path = %config.state_path.display(), "opening state document");
    let store = DocumentStore::initialize(&config.state_path)?;
    for warning in store.load_warnings() {
        ui::warning(&format!("{}: {}", config.state_path.display(), warning));
    }
    Ok(store)
}
