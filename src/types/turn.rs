//! Turn requests: what one round-trip to the remote agent carries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::call::FunctionCallOutput;

/// Reference to a named agent hosted by the remote side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentReference {
    pub name: String,
    #[serde(rename = "type", default = "AgentReference::default_kind")]
    pub kind: String,
}

impl AgentReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Self::default_kind(),
        }
    }

    fn default_kind() -> String {
        "agent_reference".to_string()
    }
}

/// Input of a turn: fresh user text, or the outputs answering the previous turn's calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TurnInput {
    Text(String),
    FunctionOutputs(Vec<FunctionCallOutput>),
}

impl TurnInput {
    pub fn is_function_outputs(&self) -> bool {
        matches!(self, Self::FunctionOutputs(_))
    }
}

/// One streaming request to the remote side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnRequest {
    #[serde(rename = "conversation")]
    pub conversation_id: String,
    pub input: TurnInput,
    pub agent: AgentReference,
    pub stream: bool,
    /// Named values the agent's instructions can reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_inputs: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl TurnRequest {
    pub fn new(conversation_id: impl Into<String>, agent: AgentReference, input: TurnInput) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            input,
            agent,
            stream: true,
            structured_inputs: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_structured_inputs(
        mut self,
        inputs: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Self {
        self.structured_inputs = inputs;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
