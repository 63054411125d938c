//! # Request Processor
//!
//! OpenAI-compatible endpoints served on top of the prompt bridge.
//!
//! The processor is transport-agnostic: it receives an already-framed method, path
//! and body and always resolves to an [`HttpResponse`]. Every domain failure is turned
//! into a JSON error envelope here, so nothing above this layer sees an error.
//!
//! ## Endpoints
//!
//! - `GET /healthz` - Liveness, never touches the backend
//! - `GET {base}` - API version info
//! - `GET {base}/health` - Backend probe through the bridge
//! - `GET {base}/models` - Single-model listing
//! - `POST {base}/chat/completions` - Chat completion (non-streaming)
//!
//! `{base}` is `/` followed by the normalized API version, `/v1` by default.
//!
//! ## Example
//!
//! ```
//! use bridgeport::api::RequestProcessor;
//! use bridgeport::backend::ScriptedGenerator;
//! use bridgeport::config::BridgeportConfig;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let generator = Arc::new(ScriptedGenerator::replying(r#"{"type":"final","content":"hello"}"#));
//! let processor = RequestProcessor::new(Arc::new(BridgeportConfig::default()), generator);
//!
//! let body = br#"{"messages":[{"role":"user","content":"hi"}]}"#;
//! let response = processor.handle("POST", "/v1/chat/completions", body).await;
//! assert_eq!(response.status, 200);
//! # });
//! ```
//!
//! ## Error Handling
//!
//! All errors use the OpenAI envelope:
//! ```json
//! {
//!   "error": {
//!     "message": "messages must be a non-empty array",
//!     "type": "invalid_request_error"
//!   }
//! }
//! ```

mod completions;
mod health;
mod models;
pub mod types;

pub use types::*;

use crate::backend::TextGenerator;
use crate::bridge::PromptBridge;
use crate::config::BridgeportConfig;
use crate::http::HttpResponse;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Concrete route paths derived from the configured API version.
#[derive(Debug, Clone)]
struct Routes {
    base: String,
    health: String,
    models: String,
    chat_completions: String,
}

impl Routes {
    fn new(base: String) -> Self {
        Self {
            health: format!("{}/health", base),
            models: format!("{}/models", base),
            chat_completions: format!("{}/chat/completions", base),
            base,
        }
    }
}

/// Dispatches framed requests to endpoint handlers.
///
/// Cheap to clone; all clones share the configuration and backend.
#[derive(Debug, Clone)]
pub struct RequestProcessor {
    config: Arc<BridgeportConfig>,
    bridge: PromptBridge,
    routes: Arc<Routes>,
}

impl RequestProcessor {
    /// Create a processor for `config` backed by `generator`.
    pub fn new(config: Arc<BridgeportConfig>, generator: Arc<dyn TextGenerator>) -> Self {
        let routes = Arc::new(Routes::new(config.api.base_path()));
        Self {
            config,
            bridge: PromptBridge::new(generator),
            routes,
        }
    }

    pub fn config(&self) -> &BridgeportConfig {
        &self.config
    }

    /// Versioned base path, e.g. `/v1`.
    pub fn base_path(&self) -> &str {
        &self.routes.base
    }

    /// Handle one request. Always resolves and logs exactly one line.
    pub async fn handle(&self, method: &str, path: &str, body: &[u8]) -> HttpResponse {
        let start = Instant::now();
        let response = self.dispatch(method, path, body).await;

        info!(
            status = response.status,
            method = %method,
            path = %path,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request handled"
        );

        response
    }

    async fn dispatch(&self, method: &str, path: &str, body: &[u8]) -> HttpResponse {
        let routes = &self.routes;
        match method {
            "GET" if path == "/healthz" => health::liveness(),
            "GET" if path == routes.base => models::version(&self.config.api),
            "GET" if path == routes.health => {
                health::probe(&self.bridge, &self.config.api.model_name).await
            }
            "GET" if path == routes.models => models::list(&self.config.api),
            "POST" if path == routes.chat_completions => {
                completions::handle(&self.bridge, &self.config.api, body).await
            }
            _ => ApiError::not_found().into_response(),
        }
    }
}
