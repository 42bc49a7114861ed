//! Error types for the admin client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("token request failed: {0}")]
    Token(String),

    #[error("admin API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AdminResult<T> = Result<T, AdminError>;
