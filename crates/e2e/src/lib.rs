//! E2E test harness for the account management console
//!
//! Drives a real Chromium instance over the DevTools protocol:
//! - `browser` spawns the process and opens tabs through the DevTools
//!   HTTP endpoint
//! - `cdp` is one exclusively owned WebSocket session per target
//! - `page` layers navigation, element interaction, and retrying
//!   assertions by stable test id on top of `Runtime.evaluate`
//! - `login` walks the hosted login form
//! - `webauthn` simulates hardware security keys through the `WebAuthn`
//!   CDP domain
//!
//! The browser-dependent suites under `tests/` skip themselves unless
//! `CONSOLE_E2E_BASE_URL` points at a running console deployment.

pub mod browser;
pub mod cdp;
pub mod config;
pub mod error;
pub mod login;
pub mod page;
pub mod webauthn;

pub use browser::BrowserHandle;
pub use cdp::CdpSession;
pub use config::ConsoleConfig;
pub use error::{E2eError, E2eResult};
pub use page::Page;
pub use webauthn::{
    AuthenticatorId, AuthenticatorOptions, AuthenticatorPreset, VirtualAuthenticators,
};

/// Initialize logging for a test binary. Safe to call from every test.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
