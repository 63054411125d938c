//! Chat completions endpoint handler.

use crate::api::types::{
    ApiError, AssistantMessage, ChatCompletionRequest, ChatCompletionResponse, Choice, ToolChoice,
};
use crate::bridge::{BridgeInput, BridgeOutput, BridgeReply, PromptBridge};
use crate::config::ApiConfig;
use crate::http::HttpResponse;
use tracing::{debug, warn};

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// POST {base}/chat/completions - Validate, run through the bridge, wrap the reply.
pub async fn handle(bridge: &PromptBridge, api: &ApiConfig, body: &[u8]) -> HttpResponse {
    let request: ChatCompletionRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Rejecting undecodable chat request");
            return ApiError::bad_request("Invalid JSON").into_response();
        }
    };

    if request.stream == Some(true) {
        return ApiError::bad_request("stream=true is not implemented yet").into_response();
    }
    if request.messages.is_empty() {
        return ApiError::bad_request("messages must be a non-empty array").into_response();
    }

    let input = bridge_input(request, api);

    match bridge.run(&input).await {
        Ok(output) => HttpResponse::json(200, &completion_response(input.model.clone(), output)),
        Err(e) => {
            warn!(model = %input.model, error = %e, "Chat completion failed");
            ApiError::server_error(&format!("Bridge process failed: {}", e)).into_response()
        }
    }
}

fn bridge_input(request: ChatCompletionRequest, api: &ApiConfig) -> BridgeInput {
    BridgeInput {
        model: request.model.unwrap_or_else(|| api.model_name.clone()),
        messages: request.messages,
        tools: request.tools.unwrap_or_default(),
        tool_choice: request.tool_choice.unwrap_or(ToolChoice::Auto),
        temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_output_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    }
}

fn completion_response(model: String, output: BridgeOutput) -> ChatCompletionResponse {
    let (message, finish_reason) = match output.reply {
        BridgeReply::ToolCalls(calls) => (
            AssistantMessage {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(calls),
            },
            "tool_calls",
        ),
        BridgeReply::Content(text) => (
            AssistantMessage {
                role: "assistant".to_string(),
                content: Some(text),
                tool_calls: None,
            },
            "stop",
        ),
    };

    ChatCompletionResponse {
        id: format!("chatcmpl_{}", uuid::Uuid::new_v4().simple()),
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp(),
        model,
        choices: vec![Choice {
            index: 0,
            message,
            finish_reason: finish_reason.to_string(),
        }],
        usage: output.usage,
    }
}
