//! Command-line interface definition.
//!
//! - `streamgrid init` - create the state document
//! - `streamgrid start` - run the dashboard server
//! - `streamgrid add <URL>` / `remove <ID>` - edit sources from the shell
//! - `streamgrid list` - show sources in grid order

mod commands;

use std::path::PathBuf;

use clap::Parser;

pub use commands::{AddArgs, Command, InitArgs, ListArgs, RemoveArgs, StartArgs};

/// Streamgrid - a local dashboard for watching many streams at once
#[derive(Parser, Debug)]
#[command(
    name = "streamgrid",
    version,
    about = "A local dashboard for watching many streams at once",
    long_about = "Streamgrid keeps a grid of video embeds (YouTube, Twitch, Niconico, Vimeo,\n\
                  HLS and plain media URLs) in sync across every open dashboard window.\n\
                  State lives in one JSON file that the server watches for edits."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path of the state document
    ///
    /// Defaults to streamgrid/state.json in the user configuration
    /// directory. Also settable through STREAMGRID_STATE_PATH.
    #[arg(long = "state", global = true, value_name = "PATH")]
    pub state_path: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
