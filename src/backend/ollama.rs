//! Ollama generator implementation.

use super::{BackendError, GenerationOptions, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Generator backed by Ollama's native completion endpoint.
///
/// Sends the whole bridge prompt to `POST /api/generate` with streaming disabled
/// and returns the `response` field.
pub struct OllamaGenerator {
    /// Base URL (e.g., "http://localhost:11434")
    base_url: String,
    /// Model tag to run (e.g., "llama3.2")
    model: String,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
    /// Client-level timeout, only used to label timeout errors
    timeout_secs: Option<u64>,
}

impl OllamaGenerator {
    pub fn new(
        base_url: String,
        model: String,
        client: Arc<Client>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client,
            timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to read response body: {}", e))
        })?;

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse Ollama generate response: {}", e))
        })?;

        Ok(parsed.response)
    }
}
