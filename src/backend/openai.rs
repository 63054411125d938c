//! OpenAI-compatible generator implementation.
//!
//! Works with llama.cpp, vLLM, LM Studio and anything else serving
//! `/v1/chat/completions`. The bridge prompt is sent as a single user message.

use super::{BackendError, GenerationOptions, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct OpenAICompatGenerator {
    /// Base URL without the `/v1` suffix (e.g., "http://localhost:8080")
    base_url: String,
    model: String,
    /// Optional bearer token
    api_key: Option<String>,
    client: Arc<Client>,
    timeout_secs: Option<u64>,
}

impl OpenAICompatGenerator {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        client: Arc<Client>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            client,
            timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [PromptMessage<'a>; 1],
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct PromptMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAICompatGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            messages: [PromptMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
            stream: false,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
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

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| BackendError::InvalidResponse("Response contained no choices".to_string()))
    }
}
