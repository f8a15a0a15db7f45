//! `sitredctl start`: run the server in the foreground.

use std::sync::Arc;

use anyhow::Context;
use sitred_core::{Fetcher, RedirectSelector};
use tokio::net::TcpListener;
use tracing::info;

use crate::cli::{Cli, StartArgs};
use crate::error::CliError;
use crate::server::{self, RouterOptions, shutdown, tls};
use crate::utils::pid::PidFile;

/// Validate the configuration, claim the PID file and serve until a
/// termination signal arrives.
///
/// The PID file is claimed before the listener is bound, so a second
/// `start` fails on the lock instead of on the port.
pub async fn execute(cli: &Cli, args: &StartArgs) -> Result<(), CliError> {
    let config = args.to_config(&cli.server_pid);
    config.validate()?;
    let addr = config.server.socket_addr()?;

    let tls = tls::load(&config.server.tls).map_err(CliError::startup)?;
    let signal = shutdown::listen()
        .context("failed to install signal handlers")
        .map_err(CliError::startup)?;
    let pid_file = PidFile::acquire(&config.server.pid)?;

    let fetcher = Fetcher::new(&config.service.name, &config.service.contact)
        .context("failed to build sitemap client")
        .map_err(CliError::startup)?;
    let selector = RedirectSelector::new(Arc::new(fetcher), config.sitemap.url.clone());
    let app = server::router(
        selector,
        RouterOptions {
            access_log: config.server.log_requests,
        },
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
        .map_err(CliError::startup)?;

    info!(
        pid = %pid_file.path().display(),
        address = %addr,
        sitemap = %config.sitemap.url,
        "starting server"
    );

    server::serve(listener, tls, app, signal)
        .await
        .map_err(CliError::internal)?;

    drop(pid_file);
    info!("server stopped");
    Ok(())
}
