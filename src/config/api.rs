//! Public API surface configuration: advertised model and version prefix.

use serde::{Deserialize, Serialize};

/// Version served when the operator asks for `latest` or leaves it empty.
pub const LATEST_API_VERSION: &str = "v1";

/// Model id advertised on `/models` and echoed when a request omits `model`.
pub const DEFAULT_MODEL_NAME: &str = "apple-foundation-model";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub model_name: String,
    /// Route prefix without the leading slash, e.g. `v1`.
    pub version: String,
}

impl ApiConfig {
    /// Versioned base path, e.g. `/v1`.
    pub fn base_path(&self) -> String {
        format!("/{}", self.version)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            version: LATEST_API_VERSION.to_string(),
        }
    }
}

/// Normalize an operator-supplied API version.
///
/// Comparison is case- and whitespace-insensitive: `latest` or an empty value
/// maps to [`LATEST_API_VERSION`], a value already starting with `v` is kept
/// (trimmed), anything else gets a `v` prefix.
///
/// ```
/// use bridgeport::config::normalize_api_version;
///
/// assert_eq!(normalize_api_version("latest"), "v1");
/// assert_eq!(normalize_api_version("2"), "v2");
/// assert_eq!(normalize_api_version("v3"), "v3");
/// ```
pub fn normalize_api_version(version: &str) -> String {
    let trimmed = version.trim();
    let lowered = trimmed.to_lowercase();
    if lowered.is_empty() || lowered == "latest" {
        return LATEST_API_VERSION.to_string();
    }
    if lowered.starts_with('v') {
        return trimmed.to_string();
    }
    format!("v{}", trimmed)
}
