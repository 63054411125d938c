//! Configuration module for bridgeport
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`BRIDGEPORT_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! The merged configuration is built once at startup, normalized, validated and then
//! shared read-only behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use bridgeport::config::BridgeportConfig;
//!
//! let config = BridgeportConfig::default();
//! assert_eq!(config.server.port, 8000);
//!
//! let toml = r#"
//! [api]
//! version = "2"
//! "#;
//! let config: BridgeportConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.normalized().api.version, "v2");
//! ```

pub mod api;
pub mod backend;
pub mod error;
pub mod logging;
pub mod server;

pub use api::{normalize_api_version, ApiConfig, LATEST_API_VERSION};
pub use backend::{BackendConfig, BackendKind};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Process-wide configuration for the bridge server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeportConfig {
    /// Listener address
    pub server: ServerConfig,
    /// Advertised model and API version
    pub api: ApiConfig,
    /// Text-generation backend
    pub backend: BackendConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl BridgeportConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports BRIDGEPORT_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("BRIDGEPORT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BRIDGEPORT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(model_name) = std::env::var("BRIDGEPORT_MODEL_NAME") {
            self.api.model_name = model_name;
        }
        if let Ok(version) = std::env::var("BRIDGEPORT_API_VERSION") {
            self.api.version = version;
        }

        if let Ok(url) = std::env::var("BRIDGEPORT_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Ok(model) = std::env::var("BRIDGEPORT_BACKEND_MODEL") {
            self.backend.model = model;
        }

        if let Ok(level) = std::env::var("BRIDGEPORT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("BRIDGEPORT_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(file) = std::env::var("BRIDGEPORT_LOG_FILE") {
            self.logging.file = if file.is_empty() {
                None
            } else {
                Some(PathBuf::from(file))
            };
        }
        if let Ok(max_bytes) = std::env::var("BRIDGEPORT_LOG_MAX_BYTES") {
            if let Ok(n) = max_bytes.parse() {
                self.logging.max_bytes = n;
            }
        }
        if let Ok(max_files) = std::env::var("BRIDGEPORT_LOG_MAX_FILES") {
            if let Ok(n) = max_files.parse() {
                self.logging.max_files = n;
            }
        }

        self
    }

    /// Canonicalize derived values once all layers have been merged.
    pub fn normalized(mut self) -> Self {
        self.api.version = normalize_api_version(&self.api.version);
        self.logging.max_files = self.logging.max_files.max(1);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }

        if self.api.model_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "api.model_name".to_string(),
                message: "model name cannot be empty".to_string(),
            });
        }

        if self.backend.url.is_empty() {
            return Err(ConfigError::Validation {
                field: "backend.url".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}
