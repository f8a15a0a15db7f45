//! Random redirect selection.
//!
//! One call per inbound request: fetch the sitemap, stream it through the
//! parser, draw one URL uniformly at random. Nothing is cached and nothing is
//! retried here; retries belong to the [`Fetcher`].
//!
//! Each stage failure maps to a distinct [`SelectError`] variant. The variants
//! carry the full cause for the log, while [`SelectError::public_message`] is
//! the only text meant for clients.

use std::sync::Arc;

use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::{Error, Fetcher, sitemap};

/// Outcome of one redirect selection.
pub type RedirectOutcome = std::result::Result<String, SelectError>;

/// The stage at which a selection failed.
#[derive(Error, Debug)]
pub enum SelectError {
    /// The sitemap could not be fetched.
    #[error("failed to fetch sitemap: {0}")]
    FetchFailed(#[source] Error),

    /// The sitemap was fetched but is not well-formed XML.
    #[error("failed to parse sitemap: {0}")]
    ParseFailed(#[source] Error),

    /// The sitemap parsed but lists no page URLs.
    #[error("sitemap contains no page URLs")]
    NoCandidates,
}

impl SelectError {
    /// Generic message safe to show to clients.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::FetchFailed(_) => "Failed to fetch sitemap.",
            Self::ParseFailed(_) => "Failed to parse sitemap.",
            Self::NoCandidates => "No URLs available for redirect.",
        }
    }

    /// Stable identifier of the failed stage, for log records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FetchFailed(_) => "fetch_failed",
            Self::ParseFailed(_) => "parse_failed",
            Self::NoCandidates => "no_candidates",
        }
    }

    /// The underlying error, if the failure had one.
    #[must_use]
    pub const fn cause(&self) -> Option<&Error> {
        match self {
            Self::FetchFailed(e) | Self::ParseFailed(e) => Some(e),
            Self::NoCandidates => None,
        }
    }
}

/// Chooses a random page from a configured sitemap.
#[derive(Debug, Clone)]
pub struct RedirectSelector {
    fetcher: Arc<Fetcher>,
    sitemap_url: String,
}

impl RedirectSelector {
    /// Creates a selector reading `sitemap_url` through the shared `fetcher`.
    pub fn new(fetcher: Arc<Fetcher>, sitemap_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            sitemap_url: sitemap_url.into(),
        }
    }

    /// URL of the sitemap this selector reads.
    #[must_use]
    pub fn sitemap_url(&self) -> &str {
        &self.sitemap_url
    }

    /// Fetches and parses the sitemap, returning every candidate URL.
    ///
    /// # Errors
    ///
    /// Fails with the [`SelectError`] variant of the first stage that failed.
    pub async fn candidates(&self) -> Result<Vec<String>, SelectError> {
        let body = self
            .fetcher
            .fetch(&self.sitemap_url)
            .await
            .map_err(SelectError::FetchFailed)?;

        // The body is moved into the parser and released when it returns.
        let urls = sitemap::parse_async(body.into_reader())
            .await
            .map_err(SelectError::ParseFailed)?;

        if urls.is_empty() {
            return Err(SelectError::NoCandidates);
        }

        Ok(urls)
    }

    /// Picks a random page using the thread-local generator.
    pub async fn select(&self) -> RedirectOutcome {
        let urls = self.candidates().await?;
        pick(&urls, &mut rand::rng())
            .map(str::to_owned)
            .ok_or(SelectError::NoCandidates)
    }

    /// Picks a random page using the given generator.
    pub async fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> RedirectOutcome {
        let urls = self.candidates().await?;
        pick(&urls, rng)
            .map(str::to_owned)
            .ok_or(SelectError::NoCandidates)
    }
}

/// Draws one URL uniformly at random, or `None` if there are none.
pub fn pick<'a, R: Rng + ?Sized>(urls: &'a [String], rng: &mut R) -> Option<&'a str> {
    urls.choose(rng).map(String::as_str)
}
