//! Command implementations.
//!
//! - [`init`] - Create the state document
//! - [`start`] - Dashboard server with file watching
//! - [`add`] / [`remove`] - Edit sources from the shell
//! - [`list`] - Show sources in grid order
//!
//! Each command takes its parsed arguments plus the global configuration
//! overrides and returns a Result.

pub mod add;
pub mod init;
pub mod list;
pub mod remove;
pub mod start;
pub(crate) mod utils;

pub use add::execute as add_execute;
pub use init::execute as init_execute;
pub use list::execute as list_execute;
pub use remove::execute as remove_execute;
pub use start::execute as start_execute;
