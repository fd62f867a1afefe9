//! Tool parser for extracting tool calls from Anthropic API responses
//!
//! Handles text and tool_use content blocks, and coerces tool inputs the
//! model sometimes emits as strings back into JSON objects.

use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::llm::types::{CompletionResponse, StopReason, ToolCall, Usage};

/// Key used when a string tool input is not JSON
const FALLBACK_INPUT_KEY: &str = "query";

/// Parse a raw Anthropic API response into a CompletionResponse
pub fn parse_response(response: &Value) -> Result<CompletionResponse> {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    if let Some(blocks) = response.get("content").and_then(|c| c.as_array()) {
        for block in blocks {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                        if !content.is_empty() {
                            content.push('\n');
                        }
                        content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    if let Some(call) = parse_tool_use_block(block) {
                        tool_calls.push(call);
                    }
                }
                _ => {}
            }
        }
    }

    let stop_reason = response
        .get("stop_reason")
        .and_then(|s| s.as_str())
        .map(parse_stop_reason)
        .unwrap_or_default();

    let usage = response.get("usage").map(parse_usage).unwrap_or_default();

    Ok(CompletionResponse {
        content,
        tool_calls,
        stop_reason,
        usage,
    })
}

fn parse_tool_use_block(block: &Value) -> Option<ToolCall> {
    let id = block.get("id").and_then(|v| v.as_str())?.to_string();
    let name = block.get("name").and_then(|v| v.as_str())?.to_string();
    let mut input = normalize_tool_input(block.get("input").cloned().unwrap_or(Value::Null));

    // Streamed-then-buffered blocks may carry their arguments as partial_json; those win
    if let Some(partial) = block.get("partial_json").and_then(|v| v.as_str())
        && let Value::Object(extra) = normalize_tool_input(Value::String(partial.to_string()))
        && let Value::Object(map) = &mut input
    {
        for (key, value) in extra {
            map.insert(key, value);
        }
    }

    Some(ToolCall { id, name, input })
}

/// Coerce a tool input into a JSON object
///
/// Strings are parsed as JSON; anything unparsable becomes `{"query": <string>}`.
pub fn normalize_tool_input(input: Value) -> Value {
    match input {
        Value::Object(_) => input,
        Value::Null => Value::Object(Map::new()),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Value::Object(Map::new());
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => Value::Object(map),
                _ => json!({ FALLBACK_INPUT_KEY: text }),
            }
        }
        other => json!({ FALLBACK_INPUT_KEY: other }),
    }
}

fn parse_stop_reason(reason: &str) -> StopReason {
    match reason {
        "end_turn" => StopReason::EndTurn,
        "tool_use" => StopReason::ToolUse,
        "max_tokens" => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    }
}

fn parse_usage(usage: &Value) -> Usage {
    Usage {
        input_tokens: usage.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
        output_tokens: usage.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
    }
}
