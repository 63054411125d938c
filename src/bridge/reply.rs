//! Backend reply interpretation.
//!
//! Backends are asked for one of two JSON envelopes:
//!
//! ```text
//! {"type":"final","content":"<assistant text>"}
//! {"type":"tool_calls","tool_calls":[{"name":"<tool_name>","arguments":{...}}]}
//! ```
//!
//! Models follow that contract loosely, so parsing is lenient and anything that does
//! not fit becomes plain content. Interpretation never fails.

use super::BridgeReply;
use crate::api::types::{ToolCall, ToolChoice};
use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Trim the reply and strip a surrounding markdown code fence, if any.
///
/// A fence is only removed when the text has at least three lines, the first starts
/// with ```` ``` ```` and the last is exactly ```` ``` ````.
///
/// ```
/// use bridgeport::bridge::reply::normalize_reply;
///
/// assert_eq!(normalize_reply("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(normalize_reply("  plain  "), "plain");
/// ```
pub fn normalize_reply(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();
    if lines.len() < 3 || lines[lines.len() - 1] != FENCE {
        return trimmed.to_string();
    }

    lines[1..lines.len() - 1].join("\n").trim().to_string()
}

/// Encode a tool-call `arguments` value as JSON text.
///
/// - a string holding a JSON object or array is re-encoded compactly
/// - an object or array is encoded compactly
/// - anything else is wrapped as `{"value": "<text>"}`
///
/// The result always parses as JSON.
pub fn encode_arguments(value: &Value) -> String {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed.to_string(),
            _ => wrap_value(text),
        },
        Value::Object(_) | Value::Array(_) => value.to_string(),
        other => wrap_value(&other.to_string()),
    }
}

fn wrap_value(text: &str) -> String {
    serde_json::json!({ "value": text }).to_string()
}

fn empty_arguments() -> Value {
    Value::Object(Map::new())
}

/// Named entries of a `tool_calls` array as `(name, arguments)` pairs.
///
/// Entries that are not objects or lack a string `name` are skipped individually.
fn named_entries(calls: &[Value]) -> Vec<(&str, &Value)> {
    calls
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            Some((name, entry.get("arguments").unwrap_or(&Value::Null)))
        })
        .collect()
}

fn arguments_or_empty(arguments: &Value) -> String {
    match arguments {
        Value::Null => encode_arguments(&empty_arguments()),
        other => encode_arguments(other),
    }
}

fn parse_tool_calls(calls: &[Value], choice: &ToolChoice) -> Option<BridgeReply> {
    let entries = named_entries(calls);

    if let ToolChoice::Named(required) = choice {
        let arguments = entries
            .iter()
            .find(|(name, _)| *name == required.as_str())
            .or_else(|| entries.first())
            .map(|(_, args)| arguments_or_empty(args))
            .unwrap_or_else(|| encode_arguments(&empty_arguments()));
        return Some(BridgeReply::ToolCalls(vec![ToolCall::function(
            required.clone(),
            arguments,
        )]));
    }

    let mapped: Vec<ToolCall> = entries
        .into_iter()
        .map(|(name, args)| ToolCall::function(name, arguments_or_empty(args)))
        .collect();

    if mapped.is_empty() {
        None
    } else {
        Some(BridgeReply::ToolCalls(mapped))
    }
}

fn parse_final(envelope: &Map<String, Value>, choice: &ToolChoice) -> Option<BridgeReply> {
    if let ToolChoice::Named(required) = choice {
        let arguments = match envelope.get("content") {
            Some(content) => encode_arguments(content),
            None => encode_arguments(&empty_arguments()),
        };
        return Some(BridgeReply::ToolCalls(vec![ToolCall::function(
            required.clone(),
            arguments,
        )]));
    }

    match envelope.get("content")? {
        Value::String(text) => Some(BridgeReply::Content(text.clone())),
        other => Some(BridgeReply::Content(other.to_string())),
    }
}

/// Interpret a normalized backend reply under the active tool choice.
///
/// Anything that does not match the reply contract is returned verbatim as
/// [`BridgeReply::Content`].
pub fn parse_reply(normalized: &str, choice: &ToolChoice) -> BridgeReply {
    interpret(normalized, choice).unwrap_or_else(|| BridgeReply::Content(normalized.to_string()))
}

fn interpret(normalized: &str, choice: &ToolChoice) -> Option<BridgeReply> {
    let parsed: Value = serde_json::from_str(normalized).ok()?;
    let envelope = parsed.as_object()?;

    match envelope.get("type")?.as_str()? {
        "tool_calls" => {
            let calls = envelope.get("tool_calls")?.as_array()?;
            parse_tool_calls(calls, choice)
        }
        "final" => parse_final(envelope, choice),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(name: &str) -> ToolChoice {
        ToolChoice::Named(name.to_string())
    }

    fn tool_calls(reply: BridgeReply) -> Vec<ToolCall> {
        match reply {
            BridgeReply::ToolCalls(calls) => calls,
            BridgeReply::Content(text) => panic!("expected tool calls, got content {:?}", text),
        }
    }

    fn content(reply: BridgeReply) -> String {
        match reply {
            BridgeReply::Content(text) => text,
            BridgeReply::ToolCalls(calls) => panic!("expected content, got {:?}", calls),
        }
    }

    #[test]
    fn test_normalize_strips_fence() {
        assert_eq!(
            normalize_reply("\n```json\n{\"type\":\"final\"}\n```\n"),
            "{\"type\":\"final\"}"
        );
        assert_eq!(normalize_reply("```\n  a\nb  \n```"), "a\nb");
    }

    #[test]
    fn test_normalize_keeps_incomplete_fences() {
        assert_eq!(normalize_reply("```{\"a\":1}```"), "```{\"a\":1}```");
        assert_eq!(normalize_reply("```\n{}"), "```\n{}");
        assert_eq!(normalize_reply("```\n{}\n```x"), "```\n{}\n```x");
        assert_eq!(normalize_reply("text\n```"), "text\n```");
    }

    #[test]
    fn test_encode_arguments_string_with_json_object() {
        assert_eq!(encode_arguments(&json!("{ \"q\" : \"x\" }")), r#"{"q":"x"}"#);
        assert_eq!(encode_arguments(&json!("[1, 2]")), "[1,2]");
    }

    #[test]
    fn test_encode_arguments_plain_string() {
        assert_eq!(encode_arguments(&json!("Oslo")), r#"{"value":"Oslo"}"#);
        // JSON scalars inside strings are not unwrapped
        assert_eq!(encode_arguments(&json!("42")), r#"{"value":"42"}"#);
        assert_eq!(
            encode_arguments(&json!("say \"hi\"")),
            r#"{"value":"say \"hi\""}"#
        );
    }

    #[test]
    fn test_encode_arguments_structured_and_scalars() {
        assert_eq!(encode_arguments(&json!({"a": [1, {"b": null}]})), r#"{"a":[1,{"b":null}]}"#);
        assert_eq!(encode_arguments(&json!([])), "[]");
        assert_eq!(encode_arguments(&json!(7)), r#"{"value":"7"}"#);
        assert_eq!(encode_arguments(&json!(true)), r#"{"value":"true"}"#);
        assert_eq!(encode_arguments(&Value::Null), r#"{"value":"null"}"#);
    }

    #[test]
    fn test_final_string_content() {
        let reply = parse_reply(r#"{"type":"final","content":"hello"}"#, &ToolChoice::Auto);
        assert_eq!(content(reply), "hello");
    }

    #[test]
    fn test_final_structured_content_is_encoded() {
        let reply = parse_reply(r#"{"type":"final","content":{"a": 1}}"#, &ToolChoice::Auto);
        assert_eq!(content(reply), r#"{"a":1}"#);

        let reply = parse_reply(r#"{"type":"final","content":12.5}"#, &ToolChoice::None);
        assert_eq!(content(reply), "12.5");

        let reply = parse_reply(r#"{"type":"final","content":null}"#, &ToolChoice::Auto);
        assert_eq!(content(reply), "null");
    }

    #[test]
    fn test_final_without_content_falls_back() {
        let text = r#"{"type":"final"}"#;
        assert_eq!(content(parse_reply(text, &ToolChoice::Auto)), text);
    }

    #[test]
    fn test_tool_calls_mapping_skips_unnamed() {
        let text = r#"{"type":"tool_calls","tool_calls":[
            {"name":"a","arguments":{"x":1}},
            {"arguments":{"y":2}},
            {"name":"b","arguments":"{\"z\":3}"},
            {"name":"c"},
            "garbage"
        ]}"#;
        let calls = tool_calls(parse_reply(text, &ToolChoice::Auto));

        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].function.name, "a");
        assert_eq!(calls[0].function.arguments, r#"{"x":1}"#);
        assert_eq!(calls[1].function.name, "b");
        assert_eq!(calls[1].function.arguments, r#"{"z":3}"#);
        assert_eq!(calls[2].function.name, "c");
        assert_eq!(calls[2].function.arguments, "{}");
        assert_ne!(calls[0].id, calls[1].id);
    }

    #[test]
    fn test_empty_tool_calls_falls_back() {
        let text = r#"{"type":"tool_calls","tool_calls":[{"arguments":{}}]}"#;
        assert_eq!(content(parse_reply(text, &ToolChoice::Auto)), text);

        let text = r#"{"type":"tool_calls","tool_calls":{}}"#;
        assert_eq!(content(parse_reply(text, &ToolChoice::Auto)), text);
    }

    #[test]
    fn test_unknown_or_missing_type_falls_back() {
        for text in [
            r#"{"type":"other","content":"x"}"#,
            r#"{"content":"x"}"#,
            r#"{"type":5}"#,
            r#"["final"]"#,
            "just words",
            "",
        ] {
            assert_eq!(content(parse_reply(text, &ToolChoice::Auto)), text);
        }
    }

    #[test]
    fn test_named_choice_from_final() {
        let reply = parse_reply(r#"{"type":"final","content":{"query":"x"}}"#, &named("lookup"));
        let calls = tool_calls(reply);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "lookup");
        assert_eq!(calls[0].function.arguments, r#"{"query":"x"}"#);
    }

    #[test]
    fn test_named_choice_from_final_text_or_missing_content() {
        let calls = tool_calls(parse_reply(r#"{"type":"final","content":"Oslo"}"#, &named("w")));
        assert_eq!(calls[0].function.arguments, r#"{"value":"Oslo"}"#);

        let calls = tool_calls(parse_reply(r#"{"type":"final"}"#, &named("w")));
        assert_eq!(calls[0].function.arguments, "{}");
    }

    #[test]
    fn test_named_choice_from_tool_calls_prefers_matching_entry() {
        let text = r#"{"type":"tool_calls","tool_calls":[
            {"name":"other","arguments":{"a":1}},
            {"name":"lookup","arguments":{"b":2}}
        ]}"#;
        let calls = tool_calls(parse_reply(text, &named("lookup")));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "lookup");
        assert_eq!(calls[0].function.arguments, r#"{"b":2}"#);
    }

    #[test]
    fn test_named_choice_from_tool_calls_without_match() {
        let text = r#"{"type":"tool_calls","tool_calls":[{"name":"other","arguments":{"a":1}}]}"#;
        let calls = tool_calls(parse_reply(text, &named("lookup")));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "lookup");
        assert_eq!(calls[0].function.arguments, r#"{"a":1}"#);

        let text = r#"{"type":"tool_calls","tool_calls":[]}"#;
        let calls = tool_calls(parse_reply(text, &named("lookup")));
        assert_eq!(calls[0].function.arguments, "{}");
    }

    #[test]
    fn test_named_choice_unparseable_reply_falls_back() {
        assert_eq!(content(parse_reply("no json here", &named("lookup"))), "no json here");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_json() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(|n| json!(n)),
                ".*".prop_map(Value::String),
            ];
            leaf.prop_recursive(3, 16, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::hash_map("[a-z]{1,4}", inner, 0..4)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #[test]
            fn prop_arguments_always_parse_as_json(value in arb_json()) {
                let encoded = encode_arguments(&value);
                prop_assert!(serde_json::from_str::<Value>(&encoded).is_ok());
            }

            #[test]
            fn prop_non_json_reply_is_returned_verbatim(text in "[^{\\[]*") {
                let normalized = normalize_reply(&text);
                prop_assume!(serde_json::from_str::<Value>(&normalized)
                    .map(|v| !v.is_object())
                    .unwrap_or(true));
                match parse_reply(&normalized, &ToolChoice::Auto) {
                    BridgeReply::Content(out) => prop_assert_eq!(out, normalized),
                    BridgeReply::ToolCalls(_) => prop_assert!(false, "unexpected tool calls"),
                }
            }
        }
    }
}
