//! Tool catalog parsing from the gateway listing
//!
//! The gateway answers `GET /tools` with either a bare array of tool entries
//! or an object holding them under `tools`. Entries spell the schema as
//! `input_schema` or `inputSchema`; an optional `output_schema` /
//! `outputSchema` marks a structured result.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::{Map, Value, json};

use crate::error::{McpflowError, Result};

use super::definition::{ResultShape, ToolDescriptor};

/// Immutable set of tool descriptors keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from descriptors; the first descriptor for a name wins
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        let mut tools = BTreeMap::new();
        for descriptor in descriptors {
            if tools.contains_key(&descriptor.name) {
                warn!("Skipping duplicate tool '{}' in catalog", descriptor.name);
                continue;
            }
            tools.insert(descriptor.name.clone(), descriptor);
        }
        Self { tools }
    }

    /// Parse a catalog from the gateway's JSON listing
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| McpflowError::MalformedCatalog(format!("listing is not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Parse a catalog from an already-decoded listing
    pub fn from_value(listing: &Value) -> Result<Self> {
        let entries = match listing {
            Value::Array(entries) => entries,
            Value::Object(obj) => obj.get("tools").and_then(Value::as_array).ok_or_else(|| {
                McpflowError::MalformedCatalog("listing object has no 'tools' array".to_string())
            })?,
            other => {
                return Err(McpflowError::MalformedCatalog(format!(
                    "expected an array or object listing, got {}",
                    json_type_name(other)
                )));
            }
        };

        let mut descriptors = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            descriptors.push(Self::parse_entry(index, entry)?);
        }
        debug!("Parsed {} catalog entries", descriptors.len());

        Ok(Self::from_descriptors(descriptors))
    }

    /// Convert one listing entry into a descriptor
    fn parse_entry(index: usize, entry: &Value) -> Result<ToolDescriptor> {
        let obj = entry.as_object().ok_or_else(|| {
            McpflowError::MalformedCatalog(format!("entry {} is not an object", index))
        })?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| McpflowError::MalformedCatalog(format!("entry {} has no name", index)))?;

        let schema = schema_field(obj, "input_schema", "inputSchema")
            .ok_or_else(|| McpflowError::MalformedCatalog(format!("tool '{}' has no input schema", name)))?;
        if !schema.is_object() {
            return Err(McpflowError::MalformedCatalog(format!(
                "tool '{}' has a non-object input schema",
                name
            )));
        }

        let description = obj.get("description").and_then(Value::as_str).unwrap_or_default();

        let mut descriptor = ToolDescriptor::new(name, description).with_schema(schema.clone());
        if let Some(output) = schema_field(obj, "output_schema", "outputSchema") {
            descriptor = descriptor.with_output_schema(output.clone());
        }
        Ok(descriptor)
    }

    /// Serialize back into the gateway listing format
    pub fn to_value(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .values()
            .map(|tool| {
                let mut entry = json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.input_schema,
                });
                if let ResultShape::Structured(schema) = &tool.result_shape {
                    entry["output_schema"] = schema.clone();
                }
                entry
            })
            .collect();
        json!({ "tools": tools })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// List all tool names, sorted
    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Get all tools
    pub fn all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

fn schema_field<'a>(obj: &'a Map<String, Value>, snake: &str, camel: &str) -> Option<&'a Value> {
    obj.get(snake).or_else(|| obj.get(camel)).filter(|v| !v.is_null())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LISTING: &str = r#"{
        "tools": [
            {
                "name": "read_file",
                "description": "Read file contents",
                "input_schema": {
                    "type": "object",
                    "properties": { "path": { "type": "string" } },
                    "required": ["path"]
                }
            },
            {
                "name": "write_file",
                "description": "Write content to file",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": { "type": "string" },
                        "content": { "type": "string" }
                    },
                    "required": ["path", "content"]
                }
            },
            {
                "name": "git_status",
                "description": "Show working tree status",
                "input_schema": { "type": "object", "properties": {} }
            },
            {
                "name": "search_repositories",
                "description": "Search GitHub repositories",
                "input_schema": {
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                },
                "outputSchema": { "type": "object" }
            }
        ]
    }"#;

    #[test]
    fn test_catalog_new_empty() {
        let catalog = ToolCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
    }

    #[test]
    fn test_catalog_from_json() {
        let catalog = ToolCatalog::from_json(SAMPLE_LISTING).unwrap();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.contains("read_file"));
        assert!(catalog.contains("write_file"));
        assert!(catalog.contains("git_status"));
        assert!(catalog.contains("search_repositories"));
    }

    #[test]
    fn test_catalog_accepts_camel_case_schema() {
        let catalog = ToolCatalog::from_json(SAMPLE_LISTING).unwrap();
        let tool = catalog.get("write_file").unwrap();
        assert_eq!(tool.required(), vec!["path", "content"]);
    }

    #[test]
    fn test_catalog_output_schema() {
        let catalog = ToolCatalog::from_json(SAMPLE_LISTING).unwrap();
        assert!(catalog.get("search_repositories").unwrap().result_shape.is_structured());
        assert!(!catalog.get("read_file").unwrap().result_shape.is_structured());
    }

    #[test]
    fn test_catalog_bare_array_listing() {
        let catalog = ToolCatalog::from_json(
            r#"[{"name": "list_directory", "input_schema": {"type": "object", "properties": {"path": {"type": "string"}}}}]"#,
        )
        .unwrap();
        assert_eq!(catalog.list(), vec!["list_directory"]);
        assert_eq!(catalog.get("list_directory").unwrap().description, "");
    }

    #[test]
    fn test_catalog_list_sorted() {
        let catalog = ToolCatalog::from_json(SAMPLE_LISTING).unwrap();
        assert_eq!(
            catalog.list(),
            vec!["git_status", "read_file", "search_repositories", "write_file"]
        );
    }

    #[test]
    fn test_catalog_missing_name() {
        let result = ToolCatalog::from_json(r#"[{"description": "nameless", "input_schema": {}}]"#);
        match result {
            Err(McpflowError::MalformedCatalog(msg)) => assert!(msg.contains("entry 0 has no name")),
            other => panic!("expected MalformedCatalog, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_missing_schema() {
        let result = ToolCatalog::from_json(r#"[{"name": "run_command", "description": "Run"}]"#);
        match result {
            Err(McpflowError::MalformedCatalog(msg)) => assert!(msg.contains("run_command")),
            other => panic!("expected MalformedCatalog, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_non_object_schema() {
        let result = ToolCatalog::from_json(r#"[{"name": "x", "input_schema": "string"}]"#);
        assert!(matches!(result, Err(McpflowError::MalformedCatalog(_))));
    }

    #[test]
    fn test_catalog_invalid_json() {
        let result = ToolCatalog::from_json("<html>gateway</html>");
        assert!(matches!(result, Err(McpflowError::MalformedCatalog(_))));
    }

    #[test]
    fn test_catalog_object_without_tools() {
        let result = ToolCatalog::from_json(r#"{"items": []}"#);
        assert!(matches!(result, Err(McpflowError::MalformedCatalog(_))));
    }

    #[test]
    fn test_catalog_duplicate_first_wins() {
        let catalog = ToolCatalog::from_json(
            r#"[
                {"name": "read_file", "description": "first", "input_schema": {"type": "object"}},
                {"name": "read_file", "description": "second", "input_schema": {"type": "object"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("read_file").unwrap().description, "first");
    }

    #[test]
    fn test_catalog_round_trip() {
        let catalog = ToolCatalog::from_json(SAMPLE_LISTING).unwrap();
        let serialized = catalog.to_json().unwrap();
        let reparsed = ToolCatalog::from_json(&serialized).unwrap();
        assert_eq!(catalog, reparsed);
    }
}
