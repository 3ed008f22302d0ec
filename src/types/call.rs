//! Function-call requests from the remote side and the outputs sent back.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// A function invocation the remote side finished requesting during a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCallRequest {
    /// Correlation token; the matching output must echo it.
    pub call_id: String,
    pub name: String,
    /// Arguments exactly as the remote side finalized them.
    pub arguments: RawArguments,
}

/// Arguments as they arrive: a serialized JSON string, or an already parsed value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawArguments {
    Text(String),
    Structured(serde_json::Value),
}

impl Default for RawArguments {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for RawArguments {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RawArguments {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<serde_json::Value> for RawArguments {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// The result of one function call, ready to be submitted as turn input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCallOutput {
    #[serde(rename = "type")]
    pub kind: FunctionCallOutputKind,
    pub call_id: String,
    /// JSON-serialized tool result.
    pub output: String,
}

/// Wire discriminator for [`FunctionCallOutput`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCallOutputKind {
    #[default]
    FunctionCallOutput,
}

impl FunctionCallOutput {
    /// Serialize a tool result for the given call.
    pub fn new(call_id: impl Into<String>, result: &serde_json::Value) -> Self {
        Self {
            kind: FunctionCallOutputKind::FunctionCallOutput,
            call_id: call_id.into(),
            output: result.to_string(),
        }
    }

    /// Output reporting a failed tool to the remote side.
    pub fn error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(call_id, &serde_json::json!({ "error": message.into() }))
    }
}

/// Check that `outputs` answers `calls` one-to-one.
///
/// Every requested `call_id` must have exactly one output, and no output may
/// refer to a call that was not requested in the same turn.
pub fn verify_outputs(
    calls: &[FunctionCallRequest],
    outputs: &[FunctionCallOutput],
) -> Result<(), RelayError> {
    let requested: HashSet<&str> = calls.iter().map(|c| c.call_id.as_str()).collect();
    let mut answered: HashSet<&str> = HashSet::with_capacity(outputs.len());

    for output in outputs {
        if !requested.contains(output.call_id.as_str()) {
            return Err(RelayError::InvalidState(format!(
                "output for call '{}' was not requested in this turn",
                output.call_id
            )));
        }
        if !answered.insert(output.call_id.as_str()) {
            return Err(RelayError::InvalidState(format!(
                "duplicate output for call '{}'",
                output.call_id
            )));
        }
    }

    if let Some(missing) = requested.iter().find(|id| !answered.contains(*id)) {
        return Err(RelayError::InvalidState(format!(
            "no output for requested call '{missing}'"
        )));
    }

    Ok(())
}
