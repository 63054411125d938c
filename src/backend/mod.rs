//! Text-generation backend abstraction.
//!
//! The bridge only ever needs one capability from a model: turn a prompt string into
//! a reply string. [`TextGenerator`] captures exactly that, so the request pipeline can
//! run against a real model server or an in-memory [`ScriptedGenerator`] alike.

use async_trait::async_trait;

pub mod error;
pub mod factory;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use error::BackendError;
pub use factory::create_generator;
pub use ollama::OllamaGenerator;
pub use openai::OpenAICompatGenerator;
pub use scripted::ScriptedGenerator;

/// Sampling knobs forwarded to backends that support them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1024,
        }
    }
}

/// Opaque prompt-in, text-out generation capability.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    /// Human-readable backend name for logging (e.g., "ollama").
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    ///
    /// # Returns
    ///
    /// - `Ok(String)` with the raw generated text
    /// - `Err(BackendError::Network)` if the backend is unreachable
    /// - `Err(BackendError::Upstream)` if the backend answered with an error status
    /// - `Err(BackendError::InvalidResponse)` if the reply could not be understood
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendError>;
}
