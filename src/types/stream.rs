//! Streaming event types for one remote turn.

use serde::{Deserialize, Serialize};

use super::call::{FunctionCallRequest, RawArguments};
use super::usage::Usage;

/// One event of a turn's response stream.
///
/// Event kinds this crate does not act on deserialize into [`TurnEvent::Other`],
/// so every consumer still has to decide what to do with them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TurnEvent {
    #[serde(rename = "response.output_item.added")]
    ItemAdded { item: OutputItem },

    #[serde(rename = "response.output_item.done")]
    ItemDone { item: OutputItem },

    #[serde(rename = "response.output_text.delta")]
    TextDelta {
        #[serde(default)]
        item_id: Option<String>,
        delta: String,
    },

    #[serde(rename = "response.output_text.done")]
    TextDone {
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        text: String,
    },

    #[serde(rename = "response.activity")]
    Activity { activity: String },

    #[serde(rename = "response.completed", alias = "response.done")]
    Completed {
        #[serde(default)]
        response: TurnSummary,
    },

    #[serde(rename = "response.failed")]
    Failed {
        #[serde(default)]
        response: TurnSummary,
    },

    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
    },

    #[serde(other)]
    Other,
}

/// Final response object attached to completion/failure events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TurnSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TurnError>,
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TurnError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// An output item of a turn, discriminated by its `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        id: String,
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        created_by: Option<CreatedBy>,
    },
    FunctionCall {
        #[serde(default)]
        id: Option<String>,
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: RawArguments,
        #[serde(default)]
        status: Option<String>,
    },
    WorkflowAction {
        #[serde(default)]
        action_id: String,
        #[serde(default)]
        status: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Producer of a message item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreatedBy {
    #[serde(default)]
    pub agent: Option<CreatedByAgent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreatedByAgent {
    #[serde(default)]
    pub name: Option<String>,
}

impl OutputItem {
    /// The finalized call request, if this is a function call the remote side completed.
    pub fn completed_call(&self) -> Option<FunctionCallRequest> {
        match self {
            Self::FunctionCall {
                call_id,
                name,
                arguments,
                status,
                ..
            } if status.as_deref() == Some("completed") => Some(FunctionCallRequest {
                call_id: call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            }),
            _ => None,
        }
    }

    /// Display name of the agent that produced an assistant message.
    pub fn agent_name(&self) -> Option<String> {
        match self {
            Self::Message { created_by, .. } => created_by
                .as_ref()
                .and_then(|c| c.agent.as_ref())
                .and_then(|a| a.name.clone()),
            _ => None,
        }
    }
}
