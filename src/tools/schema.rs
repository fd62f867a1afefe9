//! Argument validation against a tool's JSON input schema
//!
//! Covers the subset of JSON Schema gateway tools actually declare:
//! `required`, per-property `type` (single or list) and `enum`.

use serde_json::{Map, Value};

use crate::error::{McpflowError, Result};

use super::definition::ToolDescriptor;

/// Validate an argument mapping, naming the first offending parameter
pub fn validate_arguments(descriptor: &ToolDescriptor, args: &Map<String, Value>) -> Result<()> {
    for field in descriptor.required() {
        if !args.contains_key(field) {
            return Err(violation(descriptor, field, "is required but missing"));
        }
    }

    for (name, value) in args {
        let Some(property) = descriptor.parameter(name) else {
            // Undeclared arguments go through untouched
            continue;
        };

        if let Some(expected) = property.get("type")
            && !type_matches(expected, value)
        {
            return Err(violation(
                descriptor,
                name,
                &format!("expected {} but got {}", describe_type(expected), value_type(value)),
            ));
        }

        if let Some(allowed) = property.get("enum").and_then(Value::as_array)
            && !allowed.contains(value)
        {
            return Err(violation(descriptor, name, "is not one of the allowed values"));
        }
    }

    Ok(())
}

fn violation(descriptor: &ToolDescriptor, parameter: &str, reason: &str) -> McpflowError {
    McpflowError::SchemaViolation {
        tool: descriptor.name.clone(),
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    }
}

fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(ty) => single_type_matches(ty, value),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|ty| single_type_matches(ty, value)),
        // An unrecognised type declaration constrains nothing
        _ => true,
    }
}

fn single_type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe_type(expected: &Value) -> String {
    match expected {
        Value::String(ty) => ty.clone(),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.to_string(),
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new("read_file", "Read file").with_schema(json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "offset": { "type": "integer" },
                "ratio": { "type": "number" },
                "follow": { "type": "boolean" },
                "encoding": { "type": "string", "enum": ["utf-8", "latin-1"] },
                "tags": { "type": ["array", "null"] }
            },
            "required": ["path"]
        }))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn violated_parameter(result: Result<()>) -> String {
        match result {
            Err(McpflowError::SchemaViolation { parameter, .. }) => parameter,
            other => panic!("expected SchemaViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_arguments() {
        let result = validate_arguments(
            &descriptor(),
            &args(json!({"path": "a.txt", "offset": 3, "ratio": 0.5, "follow": true, "encoding": "utf-8"})),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_required() {
        let param = violated_parameter(validate_arguments(&descriptor(), &args(json!({"offset": 1}))));
        assert_eq!(param, "path");
    }

    #[test]
    fn test_wrong_type() {
        let param = violated_parameter(validate_arguments(
            &descriptor(),
            &args(json!({"path": "a.txt", "offset": "three"})),
        ));
        assert_eq!(param, "offset");
    }

    #[test]
    fn test_integer_accepts_whole_float() {
        let result = validate_arguments(&descriptor(), &args(json!({"path": "a", "offset": 2.0})));
        assert!(result.is_ok());
        let param = violated_parameter(validate_arguments(
            &descriptor(),
            &args(json!({"path": "a", "offset": 2.5})),
        ));
        assert_eq!(param, "offset");
    }

    #[test]
    fn test_enum_constraint() {
        let param = violated_parameter(validate_arguments(
            &descriptor(),
            &args(json!({"path": "a", "encoding": "ebcdic"})),
        ));
        assert_eq!(param, "encoding");
    }

    #[test]
    fn test_type_union() {
        assert!(validate_arguments(&descriptor(), &args(json!({"path": "a", "tags": null}))).is_ok());
        assert!(validate_arguments(&descriptor(), &args(json!({"path": "a", "tags": ["x"]}))).is_ok());
        let param = violated_parameter(validate_arguments(&descriptor(), &args(json!({"path": "a", "tags": 1}))));
        assert_eq!(param, "tags");
    }

    #[test]
    fn test_undeclared_arguments_pass_through() {
        let result = validate_arguments(&descriptor(), &args(json!({"path": "a", "extra": [1, 2]})));
        assert!(result.is_ok());
    }

    #[test]
    fn test_violation_message() {
        let err = validate_arguments(&descriptor(), &args(json!({"path": 7}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema violation for tool 'read_file': parameter 'path' expected string but got integer"
        );
    }
}
