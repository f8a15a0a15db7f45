//! Termination signal handling.

use std::future::Future;
use std::io;

use tracing::{error, info};

/// Register for SIGINT and SIGTERM and return a future that resolves when
/// either arrives.
///
/// SIGTERM is registered immediately, so a `stop` issued right after the PID
/// file appears is never handled by the default action.
pub fn listen() -> io::Result<impl Future<Output = ()> + Send> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(async move {
        #[cfg(unix)]
        let terminate = async move {
            terminate.recv().await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("received SIGINT"),
                Err(e) => {
                    error!(error = %e, "failed to listen for SIGINT");
                    std::future::pending::<()>().await;
                },
            },
            () = terminate => info!("received SIGTERM"),
        }
    })
}
