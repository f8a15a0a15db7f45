//! sitredctl entry point.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match sitred_cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(category = %err.category, error = %err, "command failed");
            err.as_exit_code()
        },
    }
}
