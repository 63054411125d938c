//! Prompt construction.
//!
//! The backend only understands free text, so the whole request (conversation, tool
//! declarations and the reply contract) is flattened into a single prompt.

use crate::api::types::{ChatMessage, Tool, ToolChoice};

const PREAMBLE: &str = "You are a compatibility layer for OpenAI chat completions.";

const NO_TOOLS: &str = "You have no tools. Answer directly with plain text only.";

const REPLY_CONTRACT: &str = r#"Respond in STRICT JSON using exactly one of these formats:
1) {"type":"final","content":"<assistant text>"}
2) {"type":"tool_calls","tool_calls":[{"name":"<tool_name>","arguments":{...}}]}

Rules:
- Emit valid JSON only, no markdown fences.
- If any tool is needed, choose type=tool_calls.
- If tool_choice is none, choose type=final."#;

/// One `[role] content` line per message, in order.
///
/// ```
/// use bridgeport::api::types::ChatMessage;
/// use bridgeport::bridge::prompt::render_conversation;
///
/// let messages = vec![ChatMessage::text("system", "Be brief"), ChatMessage::text("user", "Hi")];
/// assert_eq!(render_conversation(&messages), "[system] Be brief\n[user] Hi");
/// ```
pub fn render_conversation(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}] {}", m.role, m.content.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tool_choice_line(choice: &ToolChoice) -> String {
    match choice {
        ToolChoice::Auto => "Tool choice: auto.".to_string(),
        ToolChoice::None => "Tool choice: none. Never call a tool.".to_string(),
        ToolChoice::Named(name) => format!("Tool choice: required tool is {}.", name),
    }
}

/// Tool declarations plus the strict JSON reply contract.
pub fn tools_block(tools: &[Tool], choice: &ToolChoice) -> String {
    if tools.is_empty() {
        return NO_TOOLS.to_string();
    }

    let tools_json = serde_json::to_string(tools).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You may call tools. Available tools (OpenAI schema JSON):\n{}\n{}\n\n{}",
        tools_json,
        tool_choice_line(choice),
        REPLY_CONTRACT
    )
}

/// Full prompt sent to the backend.
pub fn build_prompt(messages: &[ChatMessage], tools: &[Tool], choice: &ToolChoice) -> String {
    format!(
        "{}\n{}\n\nConversation:\n{}",
        PREAMBLE,
        tools_block(tools, choice),
        render_conversation(messages)
    )
}
