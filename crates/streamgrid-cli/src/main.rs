//! Streamgrid CLI - local dashboard server for watching many streams at once.
//!
//! Parses arguments, initializes logging, and dispatches to the command
//! implementations.

use clap::Parser;
use miette::Result;
use streamgrid_cli::config::ConfigOverrides;
use streamgrid_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    ui::init_colors(args.no_color);
    logger::init_logger(args.verbose, args.quiet);

    let overrides = ConfigOverrides {
        state_path: args.state_path,
        ..Default::default()
    };

    let result = match args.command {
        cli::Command::Init(init_args) => commands::init_execute(init_args, overrides).await,
        cli::Command::Start(start_args) => commands::start_execute(start_args, overrides).await,
        cli::Command::Add(add_args) => commands::add_execute(add_args, overrides).await,
        cli::Command::Remove(remove_args) => commands::remove_execute(remove_args, overrides).await,
        cli::Command::List(list_args) => commands::list_execute(list_args, overrides).await,
    };

    result.map_err(error::cli_error_to_miette)
}
