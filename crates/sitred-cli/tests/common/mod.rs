#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

const SITRED_ENV: &[&str] = &[
    "SITRED_SERVER_PID",
    "SITRED_TLS_CERTIFICATE",
    "SITRED_TLS_KEY",
    "SITRED_TLS_VERSION",
    "SITRED_SERVER_ADDRESS",
    "SITRED_SERVER_ACCESS_LOG",
    "SITRED_SERVICE_NAME",
    "SITRED_SERVICE_CONTACT",
    "SITRED_SITEMAP_URL",
];

/// Path of the built `sitredctl` binary.
pub fn sitredctl_path() -> &'static Path {
    assert_cmd::cargo::cargo_bin!("sitredctl")
}

/// Create a `sitredctl` command isolated from the caller's `SITRED_*` settings.
pub fn sitredctl_cmd() -> Command {
    let mut cmd = Command::new(sitredctl_path());
    cmd.timeout(CMD_TIMEOUT);
    for var in SITRED_ENV {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
