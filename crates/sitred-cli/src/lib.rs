//! sitredctl - control application for the sitred random-redirect service.
//!
//! The binary is a thin wrapper around [`run`]; everything else is exposed so
//! integration tests can drive the server directly.

use clap::Parser;

pub mod cli;
mod commands;
pub mod error;
pub mod server;
pub mod utils;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::utils::initialize_logging;

/// Parse the command line and execute the requested command.
///
/// # Errors
///
/// Returns a categorized error if logging cannot be initialized or the
/// command fails.
pub async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    if let Err(err) = initialize_logging(&cli) {
        // No subscriber is installed, so tracing would drop this.
        eprintln!("sitredctl: failed to initialize logging: {err:#}");
        return Err(CliError::internal(err));
    }

    execute_command(&cli).await
}

async fn execute_command(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Start(args) => commands::start(cli, args).await,
        Commands::Stop => commands::stop(cli).await,
    }
}
