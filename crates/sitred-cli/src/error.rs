//! CLI error handling with semantic exit codes.
//!
//! Every failure of `sitredctl` is reported with an exit code that tells
//! init scripts and supervisors what kind of problem occurred.
//!
//! # Exit Code Categories
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or configuration |
//! | 3 | `State` | Server already running, or not running |
//! | 4 | `Startup` | TLS material, PID file, or listener could not be set up |
//!
//! # Usage
//!
//! ```bash
//! sitredctl stop
//! case $? in
//!     0) echo "stopped" ;;
//!     3) echo "was not running" ;;
//!     *) echo "failed" ;;
//! esac
//! ```

use std::fmt;
use std::process::ExitCode;

use sitred_core::ConfigError;

use crate::utils::pid::PidError;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    ///
    /// Use for values that parse but fail validation, such as a sitemap
    /// index URL.
    Usage = 2,

    /// The server is in the wrong state for the command (exit code 3).
    ///
    /// `start` while a server holds the PID file, or `stop` without one.
    State = 3,

    /// The server could not be brought up (exit code 4).
    ///
    /// Unreadable certificates or keys, an unwritable PID file, or an
    /// address that cannot be bound.
    Startup = 4,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::State => "state error",
            Self::Startup => "startup error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
///
/// Wraps an `anyhow::Error` with an `ErrorCategory` so the full context
/// chain survives up to `main`.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Internal, source)
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Create a state error.
    pub fn state(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::State, source)
    }

    /// Create a startup error.
    pub fn startup(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Startup, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }

    /// Create an `ExitCode` from this error.
    #[must_use]
    pub fn as_exit_code(&self) -> ExitCode {
        self.category.as_exit_code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::usage(err)
    }
}

impl From<PidError> for CliError {
    fn from(err: PidError) -> Self {
        match err {
            PidError::AlreadyRunning { .. } | PidError::NotRunning => Self::state(err),
            PidError::Io { .. } | PidError::Invalid { .. } => Self::startup(err),
            PidError::Signal(_) | PidError::StopTimeout { .. } => Self::internal(err),
        }
    }
}
