//! TLS configuration for the listener.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConfig, SupportedProtocolVersion};
use sitred_core::{TlsConfig, TlsVersion};
use tracing::debug;

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

/// Build the rustls server configuration from PEM files on disk.
///
/// HTTP/2 and HTTP/1.1 are offered through ALPN.
pub fn load(config: &TlsConfig) -> Result<Arc<ServerConfig>> {
    let certs = load_certs(&config.certificate)?;
    let key = load_key(&config.key)?;

    let versions = match config.version {
        TlsVersion::V1_2 => rustls::ALL_VERSIONS,
        TlsVersion::V1_3 => TLS13_ONLY,
    };

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut server = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(versions)
        .context("unsupported TLS protocol versions")?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("TLS certificate and key do not form a usable pair")?;

    server.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    debug!(
        certificate = %config.certificate.display(),
        min_version = %config.version,
        "loaded TLS configuration"
    );
    Ok(Arc::new(server))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .with_context(|| format!("opening TLS certificate '{}'", path.display()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading TLS certificate '{}'", path.display()))?;

    if certs.is_empty() {
        bail!("no certificates found in '{}'", path.display());
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file =
        File::open(path).with_context(|| format!("opening TLS key '{}'", path.display()))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .with_context(|| format!("reading TLS key '{}'", path.display()))?
        .ok_or_else(|| anyhow!("no private key found in '{}'", path.display()))
}
