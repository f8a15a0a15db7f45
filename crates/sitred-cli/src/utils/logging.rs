//! Logging initialization and configuration.
//!
//! Diagnostics are written to stderr as JSON lines. Access-log records use
//! their own target and go to stdout, so request logs can be collected
//! separately from everything else.

use anyhow::Result;
use tracing::Metadata;
use tracing_subscriber::filter::{EnvFilter, filter_fn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

use crate::cli::Cli;

/// Target of the per-request access-log records.
pub const ACCESS_TARGET: &str = "sitred::access";

/// Initialize the logging subsystem based on CLI flags.
///
/// `-v` and `-q` take precedence over `RUST_LOG`; without either, `RUST_LOG`
/// is honoured and falls back to `info`.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let filter = match level_override(cli.verbose, cli.quiet) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let diagnostics = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(filter)
        .with_filter(filter_fn(|meta| !is_access(meta)));

    let access = fmt::layer()
        .json()
        .with_writer(std::io::stdout)
        .with_filter(filter_fn(is_access));

    registry().with(diagnostics).with(access).try_init()?;
    Ok(())
}

fn is_access(meta: &Metadata<'_>) -> bool {
    meta.target() == ACCESS_TARGET
}

const fn level_override(verbose: bool, quiet: bool) -> Option<&'static str> {
    if verbose {
        Some("debug")
    } else if quiet {
        Some("error")
    } else {
        None
    }
}
