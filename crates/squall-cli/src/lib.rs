//! Console client for the squall daemon.
//!
//! Connects to a running daemon over its RPC channel, issues remote calls,
//! and reacts to their outcomes. The `add` command is the interactive
//! exemplar: it validates paths locally, submits one call per torrent file,
//! and reports each file's outcome on its own line.

mod cli;
mod client;
mod commands;
pub mod complete;
mod transport;

use anyhow::anyhow;
use clap::Parser;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::client::{CliError, CliResult};

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let trace_id = Uuid::new_v4();
    let span = tracing::info_span!("cli", %trace_id);

    match dispatch(cli).instrument(span).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Complete(args) => {
            let candidates = complete::complete(&args.partial)
                .map_err(|err| CliError::failure(anyhow!("completion failed: {err}")))?;
            for candidate in candidates {
                println!("{candidate}");
            }
            Ok(())
        }
        Command::Add(args) => {
            let gateway = transport::connect(&cli.daemon).await?;
            commands::add::handle_add(&gateway, args).await
        }
        Command::Events(args) => {
            let gateway = transport::connect(&cli.daemon).await?;
            commands::events::handle_events(&gateway, args).await
        }
    }
}
