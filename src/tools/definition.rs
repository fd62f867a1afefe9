//! Tool descriptors as advertised by the gateway
//!
//! A descriptor carries everything needed to validate arguments for, and
//! interpret results of, one remote operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolDefinition;

/// Shape of the payload a tool returns on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "schema", rename_all = "snake_case")]
pub enum ResultShape {
    /// Unstructured text
    Text,
    /// JSON object described by an output schema
    Structured(Value),
}

impl Default for ResultShape {
    fn default() -> Self {
        Self::Text
    }
}

impl ResultShape {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Output schema, if the tool declared one
    pub fn schema(&self) -> Option<&Value> {
        match self {
            Self::Text => None,
            Self::Structured(schema) => Some(schema),
        }
    }
}

/// A remotely hosted tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name (e.g., "read_file", "git_status")
    pub name: String,
    /// Human-readable description for the LLM
    pub description: String,
    /// JSON schema for input parameters
    pub input_schema: Value,
    /// What a successful call returns
    #[serde(default)]
    pub result_shape: ResultShape,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            result_shape: ResultShape::Text,
        }
    }

    /// Set input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Declare a structured result with the given output schema
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.result_shape = ResultShape::Structured(schema);
        self
    }

    /// Declared parameter names, in schema order
    pub fn parameters(&self) -> Vec<&str> {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Schema fragment for a single parameter
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.input_schema.get("properties").and_then(|p| p.get(name))
    }

    /// Names listed under `required`
    pub fn required(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|req| req.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters().is_empty()
    }

    /// Convert to LLM ToolDefinition for API calls
    pub fn to_llm_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name.clone(), self.description.clone(), self.input_schema.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_file() -> ToolDescriptor {
        ToolDescriptor::new("write_file", "Write content to a file").with_schema(json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["path", "content"]
        }))
    }

    #[test]
    fn test_descriptor_new() {
        let tool = ToolDescriptor::new("git_status", "Show working tree status");
        assert_eq!(tool.name, "git_status");
        assert!(!tool.has_parameters());
        assert!(tool.required().is_empty());
        assert_eq!(tool.result_shape, ResultShape::Text);
    }

    #[test]
    fn test_parameters_keep_schema_order() {
        let tool = write_file();
        assert_eq!(tool.parameters(), vec!["path", "content"]);
        assert_eq!(tool.required(), vec!["path", "content"]);
        assert_eq!(tool.parameter("path").unwrap()["type"], "string");
        assert!(tool.parameter("mode").is_none());
    }

    #[test]
    fn test_output_schema_marks_structured() {
        let tool = ToolDescriptor::new("search_repositories", "Search GitHub")
            .with_output_schema(json!({"type": "object"}));
        assert!(tool.result_shape.is_structured());
        assert_eq!(tool.result_shape.schema().unwrap()["type"], "object");
    }

    #[test]
    fn test_to_llm_definition() {
        let llm_def = write_file().to_llm_definition();
        assert_eq!(llm_def.name, "write_file");
        assert_eq!(llm_def.description, "Write content to a file");
        assert_eq!(llm_def.input_schema["required"][1], "content");
    }

    #[test]
    fn test_result_shape_serialization() {
        let json = serde_json::to_value(ResultShape::Text).unwrap();
        assert_eq!(json, json!({"type": "text"}));
        let shape: ResultShape =
            serde_json::from_value(json!({"type": "structured", "schema": {"type": "object"}})).unwrap();
        assert!(shape.is_structured());
    }
}
