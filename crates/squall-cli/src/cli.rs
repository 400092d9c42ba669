//! Command-line surface of the console client.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const DEFAULT_DAEMON_ADDR: &str = "127.0.0.1:58846";

#[derive(Parser)]
#[command(name = "squall", about = "Console client for the squall daemon")]
pub(crate) struct Cli {
    /// Daemon address to connect to.
    #[arg(
        long,
        global = true,
        env = "SQUALL_DAEMON",
        default_value = DEFAULT_DAEMON_ADDR
    )]
    pub(crate) daemon: String,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Add one or more torrent files to the session.
    Add(AddArgs),
    /// Tail daemon event notifications.
    Events(EventsArgs),
    /// Print filesystem completion candidates for a partial path.
    Complete(CompleteArgs),
}

#[derive(Args)]
pub(crate) struct AddArgs {
    /// Save path for the added torrents, overriding the daemon default.
    #[arg(short = 'p', long)]
    pub(crate) path: Option<PathBuf>,
    /// Torrent files to add.
    #[arg(required = true, value_name = "TORRENT-FILE")]
    pub(crate) torrents: Vec<PathBuf>,
}

#[derive(Args)]
pub(crate) struct CompleteArgs {
    /// Partial path as typed so far.
    pub(crate) partial: String,
}

#[derive(Args, Default)]
pub(crate) struct EventsArgs {
    /// Only print events of these kinds.
    #[arg(long, value_delimiter = ',')]
    pub(crate) kind: Vec<String>,
}
