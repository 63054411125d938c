//! Generator factory for creating TextGenerator trait objects from configuration.

use super::{BackendError, OllamaGenerator, OpenAICompatGenerator, TextGenerator};
use crate::config::{BackendConfig, BackendKind};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Create a generator from backend configuration.
///
/// The HTTP client only gets a timeout when `request_timeout_seconds` is set;
/// otherwise a backend call may take as long as the model needs.
///
/// # Examples
///
/// ```
/// use bridgeport::backend::create_generator;
/// use bridgeport::config::BackendConfig;
///
/// let generator = create_generator(&BackendConfig::default()).unwrap();
/// assert_eq!(generator.name(), "ollama");
/// ```
pub fn create_generator(config: &BackendConfig) -> Result<Arc<dyn TextGenerator>, BackendError> {
    let mut builder = Client::builder().pool_max_idle_per_host(4);
    if let Some(secs) = config.request_timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = Arc::new(builder.build().map_err(|e| {
        BackendError::Configuration(format!("Failed to create HTTP client: {}", e))
    })?);

    match config.kind {
        BackendKind::Ollama => Ok(Arc::new(OllamaGenerator::new(
            config.url.clone(),
            config.model.clone(),
            client,
            config.request_timeout_seconds,
        ))),
        BackendKind::OpenAI => {
            let api_key = match &config.api_key_env {
                Some(env_var) => Some(std::env::var(env_var).map_err(|e| {
                    BackendError::Configuration(format!(
                        "Failed to read API key from env var '{}': {}",
                        env_var, e
                    ))
                })?),
                None => None,
            };

            Ok(Arc::new(OpenAICompatGenerator::new(
                config.url.clone(),
                config.model.clone(),
                api_key,
                client,
                config.request_timeout_seconds,
            )))
        }
    }
}
