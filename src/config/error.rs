//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}

impl ConfigError {
    /// True when validation rejected the listening port.
    ///
    /// The binary maps this case to exit code 2.
    pub fn is_invalid_port(&self) -> bool {
        matches!(self, ConfigError::Validation { field, .. } if field == "server.port")
    }
}
