//! Terminal status output.
//!
//! Human-facing one-line messages go to stderr; data a user might pipe
//! (`streamgrid list`) goes to stdout.
//!
//! ```no_run
//! use streamgrid_cli::ui;
//!
//! ui::init_colors(false);
//! ui::success("Dashboard running at http://127.0.0.1:3939");
//! ui::warning("No source with id 'youtube:abc'");
//! ```

mod messages;

use std::sync::atomic::{AtomicBool, Ordering};

pub use messages::{info, success, warning};

static COLORS: AtomicBool = AtomicBool::new(true);

/// Whether status messages should be coloured.
///
/// Respects `NO_COLOR` and `FORCE_COLOR`, then falls back to checking that
/// stderr is attended.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Apply the colour decision for this process. `--no-color` always wins.
pub fn init_colors(no_color: bool) {
    COLORS.store(!no_color && should_use_color(), Ordering::Relaxed);
}

/// The decision made by [`init_colors`], shared by status lines and logs.
pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}
