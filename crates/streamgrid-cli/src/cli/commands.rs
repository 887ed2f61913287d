use clap::{Args, Subcommand};

/// Available Streamgrid subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the state document if it does not exist yet
    Init(InitArgs),

    /// Start the dashboard server
    ///
    /// Serves the REST API, the WebSocket feed and the JSON-RPC endpoint,
    /// and reloads the state document when it is edited by hand.
    Start(StartArgs),

    /// Add a stream by URL
    ///
    /// A running server picks the change up from the state file.
    ///
    /// Examples:
    ///   streamgrid add https://youtu.be/dQw4w9WgXcQ
    ///   streamgrid add https://www.twitch.tv/somechannel
    Add(AddArgs),

    /// Remove a stream by id (see `streamgrid list`)
    Remove(RemoveArgs),

    /// List streams in grid order
    List(ListArgs),
}

/// Arguments for the init command
#[derive(Args, Debug, Default)]
pub struct InitArgs {}

/// Arguments for the start command
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Listen on all interfaces instead of loopback only
    ///
    /// Lets other devices on the network open the dashboard. There is no
    /// authentication, so only use this on a trusted network.
    #[arg(long)]
    pub host: bool,

    /// Do not open a browser window
    #[arg(long)]
    pub no_open: bool,
}

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Stream or video URL
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Source id, e.g. youtube:dQw4w9WgXcQ
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Arguments for the list command
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Print the source list as JSON
    #[arg(long)]
    pub json: bool,
}
