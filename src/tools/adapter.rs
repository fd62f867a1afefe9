//! Tool adapters - the uniform calling convention over gateway tools
//!
//! An adapter is built once per descriptor at registry sync time. It turns
//! whatever arguments an LLM produced into a validated [`ToolInvocation`] and
//! turns gateway payloads into a [`ToolOutput`] the workflow can feed back to
//! the next role. Both directions are pure.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ToolErrorKind};

use super::definition::ToolDescriptor;
use super::invocation::{ToolInvocation, ToolOutcome, ToolResult};
use super::schema::validate_arguments;

/// Placeholder key some LLM tool-call encoders use for a lone positional argument
const POSITIONAL_ARG_KEY: &str = "__arg1";

/// Normalized tool output handed back to the orchestration layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ToolOutput {
    /// Plain text result
    Text(String),
    /// Structured mapping result
    Structured(Map<String, Value>),
    /// The invocation failed
    Failed { kind: ToolErrorKind, message: String },
}

impl ToolOutput {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Text form used in LLM transcripts
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(map) => Value::Object(map.clone()).to_string(),
            Self::Failed { kind, message } => format!("Error: {}: {}", kind, message),
        }
    }
}

/// Invocable unit wrapping one tool descriptor
#[derive(Debug, Clone)]
pub struct ToolAdapter {
    descriptor: Arc<ToolDescriptor>,
}

impl ToolAdapter {
    pub fn new(descriptor: ToolDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Validate raw arguments and build an invocation
    ///
    /// Fails with `SchemaViolation` naming the offending parameter; nothing
    /// is sent anywhere.
    pub fn prepare(&self, raw_args: Value, deadline: Duration) -> Result<ToolInvocation> {
        let arguments = self.normalize(raw_args);
        validate_arguments(&self.descriptor, &arguments)?;
        Ok(ToolInvocation::new(self.descriptor.name.clone(), arguments, deadline))
    }

    /// Coerce the shapes LLMs emit into an argument mapping
    ///
    /// Bare strings only arrive here from `mcpflow invoke --args`; the LLM
    /// response parser has already wrapped them as `{"query": ...}`.
    pub fn normalize(&self, raw_args: Value) -> Map<String, Value> {
        if !self.descriptor.has_parameters() {
            if !is_empty_args(&raw_args) {
                debug!("Tool '{}' takes no parameters, ignoring arguments", self.name());
            }
            return Map::new();
        }

        let first_param = self.descriptor.parameters().first().map(|p| p.to_string());

        let mut args = match raw_args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                _ => bind_positional(first_param.as_deref(), Value::String(text)),
            },
            other => bind_positional(first_param.as_deref(), other),
        };

        if args.remove(POSITIONAL_ARG_KEY).is_some() {
            debug!("Dropping placeholder '{}' for tool '{}'", POSITIONAL_ARG_KEY, self.name());
        }

        args
    }

    /// Convert a gateway result into the uniform output shape
    pub fn interpret(&self, result: &ToolResult) -> ToolOutput {
        match &result.outcome {
            ToolOutcome::Failure(failure) => ToolOutput::Failed {
                kind: failure.kind,
                message: failure.message.clone(),
            },
            ToolOutcome::Success(payload) => self.interpret_payload(payload),
        }
    }

    fn interpret_payload(&self, payload: &Value) -> ToolOutput {
        match payload {
            Value::Null => ToolOutput::Text(String::new()),
            Value::String(text) => ToolOutput::Text(text.clone()),
            Value::Object(map) => {
                if self.descriptor.result_shape.is_structured()
                    && let Some(Value::Object(structured)) = map.get("structuredContent")
                {
                    return ToolOutput::Structured(structured.clone());
                }
                match content_text(map) {
                    Some(text) => ToolOutput::Text(text),
                    None => ToolOutput::Structured(map.clone()),
                }
            }
            other => ToolOutput::Text(other.to_string()),
        }
    }
}

fn is_empty_args(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.trim().is_empty() || s.trim() == "{}",
        _ => false,
    }
}

fn bind_positional(first_param: Option<&str>, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(name) = first_param {
        map.insert(name.to_string(), value);
    }
    map
}

/// Flatten MCP-style `{"content": [{"type": "text", "text": ...}]}` payloads
fn content_text(map: &Map<String, Value>) -> Option<String> {
    let blocks = map.get("content")?.as_array()?;
    let texts: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() && !blocks.is_empty() {
        return None;
    }
    Some(texts.join("\n"))
}
