//! Configuration model for the sitred service.
//!
//! The control application assembles a [`Config`] from command-line flags and
//! `SITRED_*` environment variables, then calls [`Config::validate`] before
//! anything is started. Validation stops at the first problem it finds.
//!
//! ## Examples
//!
//! ```rust
//! use sitred_core::{Config, ConfigError};
//!
//! let mut config = Config::default();
//! config.server.tls.certificate = "/etc/ssl/sitred.crt".into();
//! config.server.tls.key = "/etc/ssl/sitred.key".into();
//!
//! // No sitemap yet.
//! assert!(matches!(config.validate(), Err(ConfigError::MissingSitemapUrl)));
//!
//! config.sitemap.url = "https://example.com/sitemap.xml".to_string();
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::meta;

/// Default address the server binds to.
pub const DEFAULT_ADDRESS: &str = ":1997";

/// Default path of the PID file.
pub const DEFAULT_PID: &str = "/var/run/sitred.pid";

/// Suffix used by sitemap indexes generated by Yoast SEO for WordPress.
///
/// Indexes list other sitemaps instead of pages, so they are rejected up front.
/// The check is deliberately narrow and only catches this well-known case.
pub const SITEMAP_INDEX_SUFFIX: &str = "sitemap_index.xml";

/// A configuration rule that was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The service name is empty.
    #[error("service name is missing")]
    MissingServiceName,

    /// The service contact is empty.
    #[error("service contact is missing")]
    MissingServiceContact,

    /// No TLS certificate path was given.
    #[error("server's TLS certificate is missing")]
    MissingTlsCertificate,

    /// No TLS key path was given.
    #[error("server's TLS key is missing")]
    MissingTlsKey,

    /// The minimum TLS version is not one of the supported values.
    #[error("server's TLS version is invalid; must be 1.2 or 1.3")]
    InvalidTlsVersion(String),

    /// The bind address is empty.
    #[error("server address is missing")]
    MissingServerAddress,

    /// The bind address cannot be resolved to a socket address.
    #[error("server address '{0}' is invalid")]
    InvalidServerAddress(String),

    /// No PID file path was given.
    #[error("server PID is missing")]
    MissingServerPid,

    /// No sitemap URL was given.
    #[error("sitemap URL is missing")]
    MissingSitemapUrl,

    /// The sitemap URL is not an absolute HTTP(S) URL, or points at an index.
    #[error("sitemap URL is invalid; must be a valid URL and cannot be an index page")]
    InvalidSitemapUrl,
}

/// Minimum TLS protocol version accepted by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVersion {
    /// Accept TLS 1.2 and TLS 1.3 clients.
    V1_2,
    /// Accept TLS 1.3 clients only.
    #[default]
    V1_3,
}

impl TlsVersion {
    /// Version string as it appears on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1_2 => "1.2",
            Self::V1_3 => "1.3",
        }
    }
}

impl FromStr for TlsVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.2" => Ok(Self::V1_2),
            "1.3" => Ok(Self::V1_3),
            other => Err(ConfigError::InvalidTlsVersion(other.to_string())),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TLS material and protocol settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the PEM-encoded certificate chain.
    pub certificate: PathBuf,
    /// Path to the PEM-encoded private key.
    pub key: PathBuf,
    /// Minimum protocol version.
    pub version: TlsVersion,
}

/// Listener and process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TLS configuration.
    pub tls: TlsConfig,
    /// Bind address, either `host:port` or `:port` for all interfaces.
    pub address: String,
    /// Path to the PID file.
    pub pid: PathBuf,
    /// Whether one access-log record is written per request.
    pub log_requests: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tls: TlsConfig::default(),
            address: DEFAULT_ADDRESS.to_string(),
            pid: PathBuf::from(DEFAULT_PID),
            log_requests: false,
        }
    }
}

impl ServerConfig {
    /// Resolve the configured address to the socket address to bind.
    ///
    /// A bare `:port` binds every IPv4 interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ConfigError::MissingServerAddress);
        }

        let candidate = if address.starts_with(':') {
            format!("0.0.0.0{address}")
        } else {
            address.to_string()
        };

        candidate
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidServerAddress(self.address.clone()))
    }
}

/// Identification used on outbound requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Name of the service, the product token of the `User-Agent`.
    pub name: String,
    /// Contact information, the comment of the `User-Agent`.
    pub contact: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: meta::NAME.to_string(),
            contact: meta::URL.to_string(),
        }
    }
}

/// Where the URLs come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapConfig {
    /// URL of the sitemap to choose random pages from.
    pub url: String,
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Outbound identification.
    pub service: ServiceConfig,
    /// Listener and process settings.
    pub server: ServerConfig,
    /// Sitemap source.
    pub sitemap: SitemapConfig,
}

impl Config {
    /// Check every setting, returning the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.name.trim().is_empty() {
            return Err(ConfigError::MissingServiceName);
        }

        if self.service.contact.trim().is_empty() {
            return Err(ConfigError::MissingServiceContact);
        }

        if self.server.tls.certificate.as_os_str().is_empty() {
            return Err(ConfigError::MissingTlsCertificate);
        }

        if self.server.tls.key.as_os_str().is_empty() {
            return Err(ConfigError::MissingTlsKey);
        }

        self.server.socket_addr()?;

        if self.server.pid.as_os_str().is_empty() {
            return Err(ConfigError::MissingServerPid);
        }

        validate_sitemap_url(&self.sitemap.url)
    }
}

/// Check that `url` is usable as a sitemap source.
///
/// The URL must be an absolute `http` or `https` URL and must not be a Yoast
/// sitemap index.
pub fn validate_sitemap_url(url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ConfigError::MissingSitemapUrl);
    }

    if url.ends_with(SITEMAP_INDEX_SUFFIX) {
        return Err(ConfigError::InvalidSitemapUrl);
    }

    let parsed = Url::parse(url).map_err(|_| ConfigError::InvalidSitemapUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidSitemapUrl);
    }

    Ok(())
}
