//! Outbound sitemap fetching.
//!
//! A [`Fetcher`] is built once at startup and shared by every request. It owns
//! the only cross-request state in the service: a token-bucket rate limiter
//! that admits at most two requests per second (burst of one) toward the
//! sitemap origin, no matter how many redirects are in flight. Callers wait
//! for a token instead of failing.
//!
//! Transient failures are retried internally according to a [`RetryPolicy`];
//! the caller only ever sees the final outcome.

use std::fmt;
use std::io;
use std::num::NonZeroU32;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ConfigError;
use crate::retry::RetryPolicy;
use crate::{Error, Result, meta};

/// Steady request rate toward the sitemap origin.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 2;

/// Number of requests admitted back to back.
pub const DEFAULT_BURST: u32 = 1;

/// Default timeout for a single attempt, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Rate-limited, retrying HTTP client for sitemaps.
pub struct Fetcher {
    client: Client,
    limiter: DefaultDirectRateLimiter,
    retry: RetryPolicy,
    user_agent: String,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher with the default rate limit, retry policy and timeout.
    ///
    /// `name` and `contact` make up the `User-Agent` header.
    pub fn new(name: &str, contact: &str) -> Result<Self> {
        Self::builder(name, contact).build()
    }

    /// Starts a builder for a fetcher with non-default settings.
    #[must_use]
    pub fn builder(name: &str, contact: &str) -> FetcherBuilder {
        FetcherBuilder {
            name: name.to_string(),
            contact: contact.to_string(),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            burst: DEFAULT_BURST,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The `User-Agent` sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetches `url` and hands back its body as a stream.
    ///
    /// Every attempt, retries included, first waits for a rate-limiter token.
    /// Only a `200 OK` response is accepted.
    ///
    /// Dropping the returned future cancels the request along with any pending
    /// backoff.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` is not an absolute HTTP(S) URL (never retried)
    /// - [`Error::Status`] if the final response was not `200 OK`
    /// - [`Error::Timeout`] if the final attempt ran out of time
    /// - [`Error::Network`] if the final attempt failed at the transport level
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<SitemapBody> {
        let url = parse_url(url)?;
        let mut attempt = 0;

        loop {
            self.limiter.until_ready().await;

            match self.send(&url).await {
                Ok(body) => return Ok(body),
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    let delay = self.retry.delay_for(attempt, err.retry_after());
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "sitemap fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(&self, url: &Url) -> Result<SitemapBody> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = response.status();

        if status != StatusCode::OK {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(parse_retry_after);
            return Err(Error::Status {
                url: url.to_string(),
                status,
                retry_after,
            });
        }

        debug!(url = %url, content_length = ?response.content_length(), "sitemap response received");
        Ok(SitemapBody::new(response))
    }
}

/// Configures and creates a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetcherBuilder {
    name: String,
    contact: String,
    requests_per_second: u32,
    burst: u32,
    retry: RetryPolicy,
    timeout: Duration,
}

impl FetcherBuilder {
    /// Sets the steady request rate and burst size of the limiter.
    #[must_use]
    pub const fn rate_limit(mut self, requests_per_second: u32, burst: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self.burst = burst;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the timeout of a single attempt.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, a rate-limit value is zero, or
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<Fetcher> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingServiceName.into());
        }

        let per_second = NonZeroU32::new(self.requests_per_second)
            .ok_or_else(|| Error::Other("rate limit must admit at least one request per second".into()))?;
        let burst = NonZeroU32::new(self.burst)
            .ok_or_else(|| Error::Other("rate limit burst must be at least one".into()))?;
        let limiter = RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst));

        let user_agent = meta::user_agent(&self.name, &self.contact);
        let client = Client::builder()
            .user_agent(user_agent.clone())
            .timeout(self.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(self.timeout))
            .build()
            .map_err(Error::Network)?;

        Ok(Fetcher {
            client,
            limiter,
            retry: self.retry,
            user_agent,
        })
    }
}

/// A successful sitemap response whose body has not been read yet.
///
/// The body is consumed through [`SitemapBody::into_reader`]. Dropping the
/// value, or the reader, releases the underlying connection.
pub struct SitemapBody {
    status: StatusCode,
    content_length: Option<u64>,
    reader: StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>,
}

impl fmt::Debug for SitemapBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SitemapBody")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl SitemapBody {
    fn new(response: Response) -> Self {
        let status = response.status();
        let content_length = response.content_length();
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();

        Self {
            status,
            content_length,
            reader: StreamReader::new(stream),
        }
    }

    /// Status of the response, always `200 OK`.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Length announced by the origin, if any.
    #[must_use]
    pub const fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Turns the body into a buffered async reader for the parser.
    pub fn into_reader(self) -> impl AsyncBufRead + Unpin + Send {
        self.reader
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("request to '{url}' timed out: {err}"))
    } else {
        Error::Network(err)
    }
}

fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("'{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::InvalidUrl(format!(
            "'{url}': only absolute http and https URLs are supported"
        )));
    }
    Ok(parsed)
}

/// Reads a `Retry-After` given in seconds. HTTP dates are ignored.
fn parse_retry_after(value: &HeaderValue) -> Option<Duration> {
    value
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
