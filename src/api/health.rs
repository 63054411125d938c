//! Health endpoints.

use crate::api::types::{ChatMessage, ToolChoice};
use crate::bridge::{BridgeInput, PromptBridge};
use crate::http::HttpResponse;
use serde::Serialize;
use tracing::warn;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub ok: bool,
}

/// Backend probe result.
#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub ok: bool,
    pub check: &'static str,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /healthz - Process is up; no backend call.
pub fn liveness() -> HttpResponse {
    HttpResponse::json(200, &LivenessResponse { ok: true })
}

fn probe_input(model: &str) -> BridgeInput {
    BridgeInput {
        model: model.to_string(),
        messages: vec![ChatMessage::text("user", "ping")],
        tools: Vec::new(),
        tool_choice: ToolChoice::None,
        temperature: 0.0,
        max_output_tokens: 8,
    }
}

/// GET {base}/health - Run a tiny prompt through the bridge.
pub async fn probe(bridge: &PromptBridge, model: &str) -> HttpResponse {
    match bridge.run(&probe_input(model)).await {
        Ok(_) => HttpResponse::json(
            200,
            &ProbeResponse {
                ok: true,
                check: "model",
                model: model.to_string(),
                error: None,
            },
        ),
        Err(e) => {
            warn!(backend = bridge.backend_name(), error = %e, "Backend health probe failed");
            HttpResponse::json(
                500,
                &ProbeResponse {
                    ok: false,
                    check: "model",
                    model: model.to_string(),
                    error: Some(e.to_string()),
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, ScriptedGenerator};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_liveness_body() {
        let response = liveness();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"ok":true}"#.to_vec());
    }

    #[tokio::test]
    async fn test_probe_success_ignores_reply_content() {
        let generator = Arc::new(ScriptedGenerator::replying("anything at all"));
        let bridge = PromptBridge::new(generator.clone());

        let response = probe(&bridge, "m").await;
        assert_eq!(response.status, 200);
        assert_eq!(
            response.body_json().unwrap(),
            json!({"ok": true, "check": "model", "model": "m"})
        );

        let prompt = &generator.prompts()[0];
        assert!(prompt.ends_with("Conversation:\n[user] ping"));
        assert!(prompt.contains("You have no tools."));
    }

    #[tokio::test]
    async fn test_probe_failure_reports_error() {
        let bridge = PromptBridge::new(Arc::new(ScriptedGenerator::failing(
            BackendError::Network("connection refused".to_string()),
        )));

        let response = probe(&bridge, "m").await;
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body_json().unwrap(),
            json!({
                "ok": false,
                "check": "model",
                "model": "m",
                "error": "Network error: connection refused"
            })
        );
    }
}
