//! Error types for backend operations.

use thiserror::Error;

/// Errors that can occur while asking a backend for text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Backend cannot serve requests at all (not configured, not installed).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured deadline.
    #[error("Request timeout after {0}s")]
    Timeout(u64),

    /// Backend returned an error response (4xx, 5xx).
    #[error("Backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend response doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Map a `reqwest` transport failure, reporting timeouts separately.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: Option<u64>) -> Self {
        match timeout_secs {
            Some(secs) if err.is_timeout() => BackendError::Timeout(secs),
            _ => BackendError::Network(err.to_string()),
        }
    }
}
