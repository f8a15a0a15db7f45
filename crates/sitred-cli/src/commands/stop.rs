//! `sitredctl stop`: signal the running server and wait for it to exit.

use std::time::Duration;

use tracing::info;

use crate::cli::Cli;
use crate::error::CliError;
use crate::utils::pid;

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Stop the server recorded in the PID file.
pub async fn execute(cli: &Cli) -> Result<(), CliError> {
    let pid = pid::stop(&cli.server_pid, STOP_TIMEOUT).await?;
    info!(pid, "server stopped");
    Ok(())
}
