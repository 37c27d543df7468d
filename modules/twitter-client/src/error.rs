use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwitterError>;

#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Rate limit exceeded")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl TwitterError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, TwitterError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for TwitterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return TwitterError::Parse(err.to_string());
        }
        TwitterError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TwitterError {
    fn from(err: serde_json::Error) -> Self {
        TwitterError::Parse(err.to_string())
    }
}
