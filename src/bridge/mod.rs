//! Prompt bridge: turns a plain text generator into a chat-completion engine.
//!
//! The bridge flattens a chat request into a single prompt that embeds a strict JSON
//! reply contract, calls the backend, and maps the free-text reply back into either
//! assistant text or tool invocations. Replies that ignore the contract are never an
//! error; they come back as plain content.

pub mod prompt;
pub mod reply;

use crate::api::types::{ChatMessage, Tool, ToolCall, ToolChoice, Usage};
use crate::backend::{BackendError, GenerationOptions, TextGenerator};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Normalized chat request handed to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeInput {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<Tool>,
    pub tool_choice: ToolChoice,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// What the backend reply meant.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeReply {
    /// Plain assistant text.
    Content(String),
    /// One or more tool invocations; never empty.
    ToolCalls(Vec<ToolCall>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeOutput {
    pub reply: BridgeReply,
    /// Always zero; backends expose no token accounting.
    pub usage: Usage,
}

/// Drives one backend call per chat request.
#[derive(Clone)]
pub struct PromptBridge {
    generator: Arc<dyn TextGenerator>,
}

impl PromptBridge {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.generator.name()
    }

    /// Run a request through the backend.
    ///
    /// Fails only when the backend itself fails.
    pub async fn run(&self, input: &BridgeInput) -> Result<BridgeOutput, BackendError> {
        let prompt = prompt::build_prompt(&input.messages, &input.tools, &input.tool_choice);
        let options = GenerationOptions {
            temperature: input.temperature,
            max_output_tokens: input.max_output_tokens,
        };

        let start = Instant::now();
        let raw = self
            .generator
            .generate(&prompt, &options)
            .await
            .map_err(|e| {
                warn!(
                    backend = self.generator.name(),
                    model = %input.model,
                    error = %e,
                    "Backend generation failed"
                );
                e
            })?;

        let normalized = reply::normalize_reply(&raw);
        let reply = reply::parse_reply(&normalized, &input.tool_choice);

        debug!(
            backend = self.generator.name(),
            model = %input.model,
            prompt_chars = prompt.len(),
            reply_chars = raw.len(),
            tool_calls = matches!(reply, BridgeReply::ToolCalls(_)),
            latency_ms = start.elapsed().as_millis() as u64,
            "Backend reply interpreted"
        );

        Ok(BridgeOutput {
            reply,
            usage: Usage::default(),
        })
    }
}

impl std::fmt::Debug for PromptBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptBridge")
            .field("backend", &self.generator.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ToolSpec;
    use crate::backend::ScriptedGenerator;

    fn input(messages: Vec<ChatMessage>, tools: Vec<Tool>, tool_choice: ToolChoice) -> BridgeInput {
        BridgeInput {
            model: "test-model".to_string(),
            messages,
            tools,
            tool_choice,
            temperature: 0.7,
            max_output_tokens: 1024,
        }
    }

    fn lookup_tool() -> Tool {
        Tool {
            tool_type: "function".to_string(),
            function: ToolSpec {
                name: "lookup".to_string(),
                description: None,
                parameters: None,
            },
        }
    }

    #[tokio::test]
    async fn test_run_plain_final() {
        let generator = Arc::new(ScriptedGenerator::replying(
            r#"{"type":"final","content":"hello"}"#,
        ));
        let bridge = PromptBridge::new(generator.clone());

        let output = bridge
            .run(&input(vec![ChatMessage::text("user", "hi")], vec![], ToolChoice::Auto))
            .await
            .unwrap();

        assert_eq!(output.reply, BridgeReply::Content("hello".to_string()));
        assert_eq!(output.usage, Usage::default());

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("Conversation:\n[user] hi"));
        assert!(prompts[0].contains("You have no tools."));
    }

    #[tokio::test]
    async fn test_run_fenced_tool_calls() {
        let generator = Arc::new(ScriptedGenerator::replying(
            "```json\n{\"type\":\"tool_calls\",\"tool_calls\":[{\"name\":\"lookup\",\"arguments\":{\"q\":\"x\"}}]}\n```",
        ));
        let bridge = PromptBridge::new(generator);

        let output = bridge
            .run(&input(
                vec![ChatMessage::text("user", "find x")],
                vec![lookup_tool()],
                ToolChoice::Auto,
            ))
            .await
            .unwrap();

        match output.reply {
            BridgeReply::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].function.name, "lookup");
                assert_eq!(calls[0].function.arguments, r#"{"q":"x"}"#);
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_falls_back_to_normalized_text() {
        let bridge = PromptBridge::new(Arc::new(ScriptedGenerator::replying(
            "  Sure, the answer is 4.\n",
        )));

        let output = bridge
            .run(&input(vec![ChatMessage::text("user", "2+2")], vec![], ToolChoice::Auto))
            .await
            .unwrap();

        assert_eq!(
            output.reply,
            BridgeReply::Content("Sure, the answer is 4.".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_propagates_backend_failure() {
        let bridge = PromptBridge::new(Arc::new(ScriptedGenerator::failing(
            BackendError::Unavailable("model not loaded".to_string()),
        )));

        let err = bridge
            .run(&input(vec![ChatMessage::text("user", "hi")], vec![], ToolChoice::Auto))
            .await
            .unwrap_err();

        assert_eq!(err, BackendError::Unavailable("model not loaded".to_string()));
    }

    #[tokio::test]
    async fn test_run_named_choice_always_yields_one_call() {
        let generator = Arc::new(ScriptedGenerator::with_replies([
            r#"{"type":"final","content":{"query":"x"}}"#,
            r#"{"type":"tool_calls","tool_calls":[{"name":"other","arguments":{}}]}"#,
        ]));
        let bridge = PromptBridge::new(generator.clone());
        let request = input(
            vec![ChatMessage::text("user", "look it up")],
            vec![lookup_tool()],
            ToolChoice::Named("lookup".to_string()),
        );

        for _ in 0..2 {
            match bridge.run(&request).await.unwrap().reply {
                BridgeReply::ToolCalls(calls) => {
                    assert_eq!(calls.len(), 1);
                    assert_eq!(calls[0].function.name, "lookup");
                }
                other => panic!("unexpected reply {:?}", other),
            }
        }

        assert!(generator.prompts()[0].contains("Tool choice: required tool is lookup."));
    }

    #[test]
    fn test_backend_name() {
        let bridge = PromptBridge::new(Arc::new(ScriptedGenerator::replying("x")));
        assert_eq!(bridge.backend_name(), "scripted");
        assert!(format!("{:?}", bridge).contains("scripted"));
    }
}
