//! Build information and identification for the service.

/// Name of the service.
pub const NAME: &str = "sitred";

/// Version of the service.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Home page of the service, also the default contact.
pub const URL: &str = "https://sr.ht/~jamesponddotco/sitred";

/// Description of the control application.
pub const DESCRIPTION: &str = "a CLI tool for controlling the sitred service";

/// Build the identification string sent as `User-Agent` on outbound requests.
///
/// The format is `name/version (contact)`, so upstream operators can tell who
/// is fetching their sitemap and how to reach them.
///
/// ```rust
/// let ua = sitred_core::meta::user_agent("sitred", "admin@example.com");
/// assert!(ua.starts_with("sitred/"));
/// assert!(ua.ends_with("(admin@example.com)"));
/// ```
#[must_use]
pub fn user_agent(name: &str, contact: &str) -> String {
    if contact.is_empty() {
        return format!("{name}/{VERSION}");
    }

    format!("{name}/{VERSION} ({contact})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_includes_version_and_contact() {
        let ua = user_agent("TestService", "test@example.com");
        assert_eq!(ua, format!("TestService/{VERSION} (test@example.com)"));
    }

    #[test]
    fn test_user_agent_without_contact() {
        assert_eq!(user_agent("sitred", ""), format!("sitred/{VERSION}"));
    }
}
