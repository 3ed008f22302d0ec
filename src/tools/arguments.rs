//! Typed access to tool call arguments.

use crate::error::RelayError;
use crate::types::RawArguments;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    tool: String,
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            tool: String::new(),
            value,
        }
    }

    /// Parse raw arguments for `tool`, decoding serialized JSON on demand.
    ///
    /// An empty string is treated as an empty object.
    pub fn parse(tool: &str, raw: &RawArguments) -> Result<Self, RelayError> {
        let value = match raw {
            RawArguments::Structured(value) => value.clone(),
            RawArguments::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(trimmed).map_err(|e| {
                        RelayError::arguments(tool, format!("arguments are not valid JSON: {e}"))
                    })?
                }
            }
        };
        Ok(Self {
            tool: tool.to_string(),
            value,
        })
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    fn missing(&self, kind: &str, key: &str) -> RelayError {
        RelayError::arguments(&self.tool, format!("missing {kind} argument: {key}"))
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, RelayError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| self.missing("string", key))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get a number argument.
    pub fn get_f64(&self, key: &str) -> Result<f64, RelayError> {
        self.value
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| self.missing("number", key))
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool, RelayError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| self.missing("boolean", key))
    }

    /// Bind the arguments to a typed parameter struct by field name.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, RelayError> {
        serde_json::from_value(self.value.clone())
            .map_err(|e| RelayError::arguments(&self.tool, format!("failed to bind arguments: {e}")))
    }
}
