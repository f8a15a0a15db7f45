//! # sitred-core
//!
//! Core functionality for sitred - a service that redirects every visitor to a
//! random page of a website, chosen from that website's own XML sitemap.
//!
//! ## Architecture
//!
//! The crate is organized leaf-first:
//!
//! - **Sitemap parsing**: a streaming, scope-aware `<loc>` extractor built on
//!   `quick-xml` that never materializes the document
//! - **Fetching**: a rate-limited, retrying HTTP client that hands the response
//!   body back as a stream
//! - **Selection**: fetch, parse, and a uniform random draw over the result
//! - **Configuration**: the validated service configuration
//! - **Error Handling**: one error type with retry classification
//!
//! ## Quick Start
//!
//! ```rust
//! use sitred_core::sitemap;
//!
//! let xml = r#"<urlset>
//!   <url><loc>https://example.com/a</loc></url>
//!   <url><loc>https://example.com/b</loc></url>
//! </urlset>"#;
//!
//! let urls = sitemap::parse(xml.as_bytes())?;
//! assert_eq!(urls, ["https://example.com/a", "https://example.com/b"]);
//! # Ok::<(), sitred_core::Error>(())
//! ```
//!
//! Serving a redirect needs a [`Fetcher`] shared by every request and a
//! [`RedirectSelector`] pointed at the sitemap:
//!
//! ```no_run
//! use std::sync::Arc;
//! use sitred_core::{Fetcher, RedirectSelector};
//!
//! # async fn example() -> sitred_core::Result<()> {
//! let fetcher = Arc::new(Fetcher::new("sitred", "admin@example.com")?);
//! let selector = RedirectSelector::new(fetcher, "https://example.com/sitemap.xml");
//!
//! match selector.select().await {
//!     Ok(url) => println!("redirect to {url}"),
//!     Err(e) => eprintln!("{}", e.public_message()),
//! }
//! # Ok(())
//! # }
//! ```

/// Service configuration and validation
pub mod config;
/// Error types and result aliases
pub mod error;
/// Rate-limited, retrying sitemap fetch client
pub mod fetcher;
/// Build metadata and identification
pub mod meta;
/// Retry and backoff policy for outbound requests
pub mod retry;
/// Random redirect selection
pub mod selector;
/// Streaming sitemap parser
pub mod sitemap;

pub use config::{
    Config, ConfigError, ServerConfig, ServiceConfig, SitemapConfig, TlsConfig, TlsVersion,
};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, FetcherBuilder, SitemapBody};
pub use retry::RetryPolicy;
pub use selector::{RedirectOutcome, RedirectSelector, SelectError};
