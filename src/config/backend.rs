//! Text-generation backend configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which wire protocol the backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Ollama native `/api/generate`
    #[default]
    Ollama,
    /// Any server exposing an OpenAI-compatible `/v1/chat/completions`
    OpenAI,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "openai" => Ok(BackendKind::OpenAI),
            _ => Err(format!("Invalid backend kind: {}", s)),
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    /// Model name understood by the backend (not the advertised model id).
    pub model: String,
    /// Environment variable holding a bearer token (OpenAI-compatible only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Unset means the backend call may take as long as it takes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Ollama,
            url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            api_key_env: None,
            request_timeout_seconds: None,
        }
    }
}
