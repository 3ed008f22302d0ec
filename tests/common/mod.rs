//! Shared test helpers and scripted conversation provider.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

use relay::agent_loop::{RunEvent, RunEventPayload, RunEventSink};
use relay::error::RelayError;
use relay::provider::{ConversationProvider, TurnStream};
use relay::types::*;

/// What the provider does for one opened turn.
pub enum Step {
    /// Stream these events, then end.
    Events(Vec<TurnEvent>),
    /// Refuse to open the turn.
    Fail(fn() -> RelayError),
    /// Open a stream that never produces anything.
    Hang,
}

/// Replays scripted turns in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    repeat: Option<Vec<TurnEvent>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that answers every turn with the same events.
    pub fn repeating(events: Vec<TurnEvent>) -> Self {
        Self {
            repeat: Some(events),
            ..Self::default()
        }
    }

    pub fn then(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub fn then_events(self, events: Vec<TurnEvent>) -> Self {
        self.then(Step::Events(events))
    }

    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap().len()
    }
}

#[async_trait]
impl ConversationProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn open_turn(&self, request: &TurnRequest) -> Result<TurnStream, RelayError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        let step = match (step, &self.repeat) {
            (Some(step), _) => step,
            (None, Some(events)) => Step::Events(events.clone()),
            (None, None) => {
                return Err(RelayError::InvalidState("script exhausted".into()));
            }
        };
        match step {
            Step::Events(events) => Ok(futures::stream::iter(events.into_iter().map(Ok)).boxed()),
            Step::Fail(error) => Err(error()),
            Step::Hang => Ok(futures::stream::pending().boxed()),
        }
    }
}

pub fn usage(input: u32, output: u32) -> Usage {
    Usage {
        input_tokens: input,
        output_tokens: output,
        total_tokens: input + output,
    }
}

pub fn completed(usage: Usage) -> TurnEvent {
    TurnEvent::Completed {
        response: TurnSummary {
            status: Some("completed".into()),
            usage: Some(usage),
            ..TurnSummary::default()
        },
    }
}

fn message_item(id: &str, agent: &str) -> OutputItem {
    OutputItem::Message {
        id: id.into(),
        role: Some("assistant".into()),
        created_by: Some(CreatedBy {
            agent: Some(CreatedByAgent {
                name: Some(agent.into()),
            }),
        }),
    }
}

pub fn function_call(call_id: &str, name: &str, arguments: Value, status: &str) -> OutputItem {
    OutputItem::FunctionCall {
        id: Some(format!("fc_{call_id}")),
        call_id: call_id.into(),
        name: name.into(),
        arguments: arguments.to_string().into(),
        status: Some(status.into()),
    }
}

/// A turn in which `agent` answers with `text` and requests nothing.
pub fn text_turn(agent: &str, text: &str) -> Vec<TurnEvent> {
    let id = format!("msg_{}", agent.to_lowercase());
    vec![
        TurnEvent::ItemAdded {
            item: message_item(&id, agent),
        },
        TurnEvent::TextDelta {
            item_id: Some(id.clone()),
            delta: text.into(),
        },
        TurnEvent::TextDone {
            item_id: Some(id.clone()),
            text: text.into(),
        },
        TurnEvent::ItemDone {
            item: message_item(&id, agent),
        },
        completed(usage(10, 5)),
    ]
}

/// A turn in which `agent` answers with the JSON of `result`.
pub fn json_turn(agent: &str, result: Value) -> Vec<TurnEvent> {
    text_turn(agent, &result.to_string())
}

/// A turn that completes the given calls.
pub fn call_turn(calls: &[(&str, &str, Value)]) -> Vec<TurnEvent> {
    let mut events = Vec::new();
    for (call_id, name, args) in calls {
        events.push(TurnEvent::ItemAdded {
            item: function_call(call_id, name, json!({}), "in_progress"),
        });
        events.push(TurnEvent::ItemDone {
            item: function_call(call_id, name, args.clone(), "completed"),
        });
    }
    events.push(completed(usage(20, 3)));
    events
}

/// Records every run event for later inspection.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl EventLog {
    pub fn sink(&self) -> RunEventSink {
        let events = Arc::clone(&self.events);
        Arc::new(move |event: RunEvent| events.lock().unwrap().push(event))
    }

    pub fn payloads(&self) -> Vec<RunEventPayload> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.payload.clone())
            .collect()
    }
}

/// Function outputs submitted by `request`, or an empty list for text input.
pub fn submitted_outputs(request: &TurnRequest) -> Vec<FunctionCallOutput> {
    match &request.input {
        TurnInput::FunctionOutputs(outputs) => outputs.clone(),
        TurnInput::Text(_) => Vec::new(),
    }
}

/// Parsed JSON of the output answering `call_id`.
pub fn output_for(request: &TurnRequest, call_id: &str) -> Value {
    let output = submitted_outputs(request)
        .into_iter()
        .find(|o| o.call_id == call_id)
        .unwrap_or_else(|| panic!("no output for {call_id}"));
    serde_json::from_str(&output.output).unwrap()
}
