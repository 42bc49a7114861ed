//! Harness configuration from the environment

use std::path::PathBuf;
use std::time::Duration;

/// Settings for one e2e run, read from `CONSOLE_E2E_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the server under test
    pub base_url: String,

    /// Realm whose account console the tests drive
    pub realm: String,

    /// Test user credentials
    pub username: String,
    pub password: String,

    /// Run the browser headless
    pub headless: bool,

    /// Chromium binary override; auto-detected from PATH when unset
    pub browser_path: Option<PathBuf>,

    /// Keep the browser sandbox; disabled by default since most CI runs as root
    pub sandbox: bool,

    /// How long to wait for the DevTools endpoint on startup
    pub startup_timeout: Duration,

    /// Default deadline for retrying assertions
    pub assert_timeout: Duration,
}

impl ConsoleConfig {
    /// Build a config from the environment. Returns `None` when
    /// `CONSOLE_E2E_BASE_URL` is unset, which browser-dependent tests treat
    /// as "no console deployment available, skip".
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CONSOLE_E2E_BASE_URL").ok()?;
        Some(Self {
            base_url,
            realm: env_or("CONSOLE_E2E_REALM", "groups"),
            username: env_or("CONSOLE_E2E_USER", "jdoe"),
            password: env_or("CONSOLE_E2E_PASSWORD", "jdoe"),
            headless: std::env::var("CONSOLE_E2E_HEADED").map(|v| v != "1").unwrap_or(true),
            browser_path: std::env::var_os("CONSOLE_E2E_BROWSER").map(PathBuf::from),
            sandbox: std::env::var("CONSOLE_E2E_SANDBOX").map(|v| v == "1").unwrap_or(false),
            startup_timeout: Duration::from_secs(30),
            assert_timeout: Duration::from_secs(5),
        })
    }

    /// URL of the account console for the configured realm.
    pub fn account_url(&self) -> String {
        format!(
            "{}/realms/{}/account/",
            self.base_url.trim_end_matches('/'),
            self.realm
        )
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(base_url: &str, realm: &str) -> ConsoleConfig {
        ConsoleConfig {
            base_url: base_url.to_string(),
            realm: realm.to_string(),
            username: "jdoe".to_string(),
            password: "jdoe".to_string(),
            headless: true,
            browser_path: None,
            sandbox: false,
            startup_timeout: Duration::from_secs(30),
            assert_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn account_url_joins_realm() {
        let config = sample("http://localhost:8080", "groups");
        assert_eq!(
            config.account_url(),
            "http://localhost:8080/realms/groups/account/"
        );
    }

    #[test]
    fn account_url_trims_trailing_slash() {
        let config = sample("http://localhost:8080/", "groups");
        assert_eq!(
            config.account_url(),
            "http://localhost:8080/realms/groups/account/"
        );
    }
}
