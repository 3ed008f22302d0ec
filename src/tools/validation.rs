//! Checks a call's arguments against the tool's parameter schema before it runs.

use serde_json::{Map, Value};
use thiserror::Error;

/// First way in which arguments break a tool's parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentViolation {
    #[error("expected object arguments, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field '{0}'")]
    Missing(String),

    #[error("unexpected field '{0}'")]
    Unexpected(String),

    #[error("field '{field}' expected type '{expected}', got {actual}")]
    WrongType {
        field: String,
        expected: String,
        actual: &'static str,
    },
}

/// Validate `args` against a flat object schema.
///
/// Only the top level is checked: required names, declared property types,
/// and undeclared names when `additionalProperties` is `false`. Tool
/// parameters here are scalars, so nested schemas are not walked.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), ArgumentViolation> {
    let expects_object = schema.get("type").and_then(Value::as_str) == Some("object");
    let Some(fields) = args.as_object() else {
        return if expects_object {
            Err(ArgumentViolation::NotAnObject(type_name(args)))
        } else {
            Ok(())
        };
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    if let Some(missing) = required.into_iter().find(|name| !fields.contains_key(*name)) {
        return Err(ArgumentViolation::Missing(missing.to_string()));
    }

    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (name, value) in fields {
        let Some(declared) = properties.get(name) else {
            if closed {
                return Err(ArgumentViolation::Unexpected(name.clone()));
            }
            continue;
        };
        if let Some(expected) = declared.get("type").and_then(Value::as_str) {
            if !has_type(value, expected) {
                return Err(ArgumentViolation::WrongType {
                    field: name.clone(),
                    expected: expected.to_string(),
                    actual: type_name(value),
                });
            }
        }
    }

    Ok(())
}

fn has_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
