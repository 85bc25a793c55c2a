//! Error type for the checker's service adapters and configuration.
//!
//! Extraction gaps and reconciliation mismatches are not errors: the former
//! resolve to empty strings, the latter are reported as `Violation`s. Only
//! infrastructure failures end up here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// OAuth token could not be obtained
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WebDriver command failed
    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    /// Element never became visible (or never disappeared)
    #[error("Timed out after {secs}s waiting for {what}")]
    ElementTimeout { what: String, secs: u64 },
}

impl CheckError {
    /// Create a config error for a missing setting
    pub fn missing(setting: &str) -> Self {
        CheckError::Config(format!("{} must be set", setting))
    }
}

impl From<yup_oauth2::Error> for CheckError {
    fn from(err: yup_oauth2::Error) -> Self {
        CheckError::Auth(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
