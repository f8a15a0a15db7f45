//! Error types and handling for sitred-core operations.
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Errors carry
//! enough detail for the structured log, while the HTTP-facing layer decides
//! what (little) the client gets to see.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: reading a sitemap from a local stream
//! - **Network Errors**: transport failures talking to the sitemap origin
//! - **Status Errors**: the origin answered with something other than `200 OK`
//! - **Parse Errors**: malformed sitemap XML
//! - **Configuration Errors**: invalid service settings
//!
//! ## Recovery Hints
//!
//! [`Error::is_recoverable`] drives the fetch client's retry policy:
//!
//! ```rust
//! use sitred_core::Error;
//!
//! let transient = Error::Timeout("sitemap origin took too long".to_string());
//! let permanent = Error::Parse("unexpected end of document".to_string());
//!
//! assert!(transient.is_recoverable());
//! assert!(!permanent.is_recoverable());
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// The main error type for sitred-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Produced when a sitemap stream cannot be read. Timeouts and
    /// interruptions are considered recoverable.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Covers DNS, TLS, connection and timeout failures while talking to the
    /// sitemap origin. The underlying `reqwest::Error` is preserved.
    ///
    /// ## Recoverability
    ///
    /// Connection and timeout errors are recoverable, while request
    /// construction and redirect-loop errors are permanent.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The sitemap origin answered with a status other than `200 OK`.
    ///
    /// The body of such a response is never handed to the parser.
    #[error("Unexpected HTTP status {status} from '{url}'")]
    Status {
        /// URL that was requested.
        url: String,
        /// Status line returned by the origin, e.g. `404 Not Found`.
        status: reqwest::StatusCode,
        /// Delay requested by the origin through `Retry-After`, if any.
        retry_after: Option<Duration>,
    },

    /// Sitemap XML is malformed.
    ///
    /// ## Common Causes
    ///
    /// - Truncated downloads
    /// - Mismatched start and end tags
    /// - Invalid character encoding or escapes
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The sitemap origin did not answer within the per-attempt timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check if the error might go away if the request is simply repeated.
    ///
    /// Returns `true` for transport timeouts and connection failures, timed-out
    /// or interrupted I/O, and the HTTP statuses that signal a temporary
    /// condition on the origin (408, 429, 500, 502, 503, 504).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => matches!(status.as_u16(), 408 | 429 | 500 | 502..=504),
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier for log records.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Status { .. } => "status",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Timeout(_) => "timeout",
            Self::Other(_) => "other",
        }
    }

    /// Delay the origin asked for before the next attempt, if it sent one.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
