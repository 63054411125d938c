//! Request and response types for the OpenAI-compatible API.

use crate::http::HttpResponse;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat completion request matching OpenAI format.
///
/// Everything except `messages` is optional; defaults are applied by the
/// completions handler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A single message in the conversation.
///
/// `role` is not validated; any string is carried through to the prompt.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    /// Plain text message with the given role.
    pub fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            name: None,
            tool_calls: None,
        }
    }
}

/// Tool declaration as sent by clients: `{"type":"function","function":{...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: ToolSpec,
}

/// An externally invocable function the backend may ask for.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments; any JSON value is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Policy for whether and which tool the backend must select.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Named(String),
}

impl ToolChoice {
    /// Interpret a `tool_choice` value.
    ///
    /// - `"auto"` / `"none"` select those policies, any other string names a tool
    /// - objects name a tool through `name` or `function.name`, otherwise `auto`
    /// - every other JSON kind is rejected
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(match s.as_str() {
                "auto" => ToolChoice::Auto,
                "none" => ToolChoice::None,
                other => ToolChoice::Named(other.to_string()),
            }),
            Value::Object(obj) => {
                if let Some(Value::String(name)) = obj.get("name") {
                    return Ok(ToolChoice::Named(name.clone()));
                }
                match obj.get("function").and_then(|f| f.get("name")) {
                    Some(Value::String(name)) => Ok(ToolChoice::Named(name.clone())),
                    _ => Ok(ToolChoice::Auto),
                }
            }
            other => Err(format!("invalid tool_choice: {}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ToolChoice::from_value(&value).map_err(de::Error::custom)
    }
}

impl Serialize for ToolChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ToolChoice::Auto => serializer.serialize_str("auto"),
            ToolChoice::None => serializer.serialize_str("none"),
            ToolChoice::Named(name) => serde_json::json!({ "name": name }).serialize(serializer),
        }
    }
}

/// A tool invocation produced by the bridge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

/// Function name plus its arguments as JSON text (not a nested object).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    /// New function call with a fresh `call_<hex>` id.
    pub fn function(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Chat completion response (non-streaming).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

/// A single choice in the response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

/// Assistant message in a response.
///
/// `content` is always present on the wire and is explicitly `null` when the
/// message carries tool calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Token usage statistics.
///
/// The backends expose no token accounting, so these stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// API error response in OpenAI format.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
}

impl ApiError {
    fn new(status: u16, message: &str, error_type: &str) -> Self {
        Self {
            status,
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: error_type.to_string(),
            },
        }
    }

    /// Create a bad request error (400).
    pub fn bad_request(message: &str) -> Self {
        Self::new(400, message, "invalid_request_error")
    }

    /// Create a route not found error (404).
    pub fn not_found() -> Self {
        Self::new(404, "Not found", "invalid_request_error")
    }

    /// Create an internal server error (500).
    pub fn server_error(message: &str) -> Self {
        Self::new(500, message, "server_error")
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::json(self.status, &self)
    }
}
