//! Error types for the e2e harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Browser failed to start: {0}")]
    BrowserStartup(String),

    #[error("No Chromium binary found. Set CONSOLE_E2E_BROWSER to its path")]
    BrowserNotFound,

    #[error("DevTools endpoint not ready after {0} attempts")]
    DevToolsNotReady(usize),

    #[error("CDP error {code}: {message}")]
    Cdp { code: i64, message: String },

    #[error("Page script threw: {0}")]
    Script(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Session closed while waiting for a reply")]
    SessionClosed,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
