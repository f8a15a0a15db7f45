//! Command-line interface definitions.
//!
//! Every flag can also be set through a `SITRED_*` environment variable.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sitred_core::config::{DEFAULT_ADDRESS, DEFAULT_PID};
use sitred_core::{
    Config, ServerConfig, ServiceConfig, SitemapConfig, TlsConfig, TlsVersion, meta,
};

/// sitredctl - control the sitred random-redirect service
#[derive(Parser, Debug, Clone)]
#[command(name = "sitredctl", version, about = meta::DESCRIPTION, long_about = None)]
pub struct Cli {
    /// Path to the server's PID file
    #[arg(long, global = true, env = "SITRED_SERVER_PID", default_value = DEFAULT_PID)]
    pub server_pid: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the server
    Start(StartArgs),

    /// Stop the running server
    Stop,
}

/// Flags of the `start` command.
#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Path to the PEM-encoded TLS certificate chain
    #[arg(long, env = "SITRED_TLS_CERTIFICATE")]
    pub tls_certificate: PathBuf,

    /// Path to the PEM-encoded TLS private key
    #[arg(long, env = "SITRED_TLS_KEY")]
    pub tls_key: PathBuf,

    /// Minimum TLS version (1.2 or 1.3)
    #[arg(long, env = "SITRED_TLS_VERSION", default_value = "1.3")]
    pub tls_version: TlsVersion,

    /// Address to listen on, `host:port` or `:port`
    #[arg(long, env = "SITRED_SERVER_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub server_address: String,

    /// Write one access-log record per request to stdout
    #[arg(long, env = "SITRED_SERVER_ACCESS_LOG")]
    pub server_access_log: bool,

    /// Service name sent in the User-Agent of sitemap requests
    #[arg(long, env = "SITRED_SERVICE_NAME", default_value = meta::NAME)]
    pub service_name: String,

    /// Contact information sent in the User-Agent of sitemap requests
    #[arg(long, env = "SITRED_SERVICE_CONTACT", default_value = meta::URL)]
    pub service_contact: String,

    /// URL of the sitemap to pick pages from
    #[arg(long, env = "SITRED_SITEMAP_URL")]
    pub sitemap_url: String,
}

impl StartArgs {
    /// Assemble the service configuration. Nothing is validated here.
    #[must_use]
    pub fn to_config(&self, server_pid: &Path) -> Config {
        Config {
            service: ServiceConfig {
                name: self.service_name.clone(),
                contact: self.service_contact.clone(),
            },
            server: ServerConfig {
                tls: TlsConfig {
                    certificate: self.tls_certificate.clone(),
                    key: self.tls_key.clone(),
                    version: self.tls_version,
                },
                address: self.server_address.clone(),
                pid: server_pid.to_path_buf(),
                log_requests: self.server_access_log,
            },
            sitemap: SitemapConfig {
                url: self.sitemap_url.clone(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_start_defaults() {
        let cli = Cli::try_parse_from([
            "sitredctl",
            "start",
            "--tls-certificate",
            "cert.pem",
            "--tls-key",
            "key.pem",
            "--sitemap-url",
            "https://example.com/sitemap.xml",
        ])
        .unwrap();

        let Commands::Start(args) = &cli.command else {
            panic!("expected start command");
        };
        let config = args.to_config(&cli.server_pid);

        assert_eq!(config.service.name, "sitred");
        assert_eq!(config.service.contact, meta::URL);
        assert_eq!(config.server.address, ":1997");
        assert_eq!(config.server.tls.version, TlsVersion::V1_3);
        assert_eq!(config.server.pid, PathBuf::from("/var/run/sitred.pid"));
        assert!(!config.server.log_requests);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_start_overrides() {
        let cli = Cli::try_parse_from([
            "sitredctl",
            "--server-pid",
            "/tmp/test.pid",
            "start",
            "--tls-certificate",
            "cert.pem",
            "--tls-key",
            "key.pem",
            "--tls-version",
            "1.2",
            "--server-address",
            "127.0.0.1:8443",
            "--server-access-log",
            "--service-name",
            "example-random",
            "--service-contact",
            "ops@example.com",
            "--sitemap-url",
            "https://example.com/sitemap.xml",
        ])
        .unwrap();

        let Commands::Start(args) = &cli.command else {
            panic!("expected start command");
        };
        let config = args.to_config(&cli.server_pid);

        assert_eq!(config.server.tls.version, TlsVersion::V1_2);
        assert_eq!(config.server.address, "127.0.0.1:8443");
        assert_eq!(config.server.pid, PathBuf::from("/tmp/test.pid"));
        assert!(config.server.log_requests);
        assert_eq!(config.service.name, "example-random");
        assert_eq!(config.service.contact, "ops@example.com");
    }

    #[test]
    fn test_invalid_tls_version_is_rejected() {
        let result = Cli::try_parse_from([
            "sitredctl",
            "start",
            "--tls-certificate",
            "cert.pem",
            "--tls-key",
            "key.pem",
            "--tls-version",
            "1.1",
            "--sitemap-url",
            "https://example.com/sitemap.xml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["sitredctl", "-v", "-q", "stop"]).is_err());
    }
}
