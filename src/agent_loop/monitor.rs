//! Reduces one turn's event stream to display events and pending function calls.

use std::collections::HashSet;

use futures::StreamExt;
use tracing::{debug, trace, warn};

use super::events::{RunEventEmitter, RunEventPayload, RunEventStream};
use crate::error::RelayError;
use crate::provider::TurnStream;
use crate::types::{FunctionCallRequest, OutputItem, TurnEvent, TurnSummary, Usage};

/// Header shown for assistant messages without a producing agent name.
pub const DEFAULT_AGENT_HEADER: &str = "ASSISTANT";

/// What one finished turn left behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Completed calls in arrival order; empty means the turn is final.
    pub pending_calls: Vec<FunctionCallRequest>,
    /// Text of the last assistant message of the turn.
    pub text: String,
    pub usage: Option<Usage>,
}

/// Whether the monitor expects more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done,
}

/// Stateful reducer over the events of a single turn.
pub struct StreamMonitor<'a> {
    provider: String,
    emitter: &'a RunEventEmitter,
    current_message_id: Option<String>,
    saw_delta: bool,
    seen_calls: HashSet<String>,
    outcome: TurnOutcome,
}

impl<'a> StreamMonitor<'a> {
    pub fn new(provider: impl Into<String>, emitter: &'a RunEventEmitter) -> Self {
        Self {
            provider: provider.into(),
            emitter,
            current_message_id: None,
            saw_delta: false,
            seen_calls: HashSet::new(),
            outcome: TurnOutcome::default(),
        }
    }

    /// Consume the stream to its completion event.
    ///
    /// A stream that ends before the remote side completed the turn is a
    /// retryable [`RelayError::Stream`].
    pub async fn run(mut self, mut stream: TurnStream) -> Result<TurnOutcome, RelayError> {
        while let Some(event) = stream.next().await {
            if self.observe(event?)? == Flow::Done {
                return Ok(self.outcome);
            }
        }
        Err(RelayError::Stream(
            "turn stream ended before the turn completed".into(),
        ))
    }

    /// Apply one event in arrival order.
    pub fn observe(&mut self, event: TurnEvent) -> Result<Flow, RelayError> {
        match event {
            TurnEvent::ItemAdded { item } => self.item_added(item),
            TurnEvent::ItemDone { item } => self.item_done(item),
            TurnEvent::TextDelta { item_id, delta } => {
                self.enter_message(item_id.as_deref(), None);
                if !delta.is_empty() {
                    self.saw_delta = true;
                    self.outcome.text.push_str(&delta);
                    self.emitter.emit(
                        RunEventStream::Assistant,
                        RunEventPayload::AssistantDelta { text: delta },
                    );
                }
            }
            TurnEvent::TextDone { item_id, text } => {
                self.enter_message(item_id.as_deref(), None);
                if !self.saw_delta && !text.is_empty() {
                    self.emitter.emit(
                        RunEventStream::Assistant,
                        RunEventPayload::AssistantDelta { text: text.clone() },
                    );
                }
                if !text.is_empty() {
                    self.outcome.text = text;
                }
            }
            TurnEvent::Activity { activity } => {
                self.emitter.emit(
                    RunEventStream::Activity,
                    RunEventPayload::Activity { text: activity },
                );
            }
            TurnEvent::Completed { response } => {
                if let Some(usage) = response.usage.clone() {
                    self.emitter.emit(
                        RunEventStream::Lifecycle,
                        RunEventPayload::Usage { usage: usage.clone() },
                    );
                    self.outcome.usage = Some(usage);
                }
                debug!(
                    response_id = response.id.as_deref().unwrap_or(""),
                    pending = self.outcome.pending_calls.len(),
                    "turn completed"
                );
                return Ok(Flow::Done);
            }
            TurnEvent::Failed { response } => return Err(self.failure(&response)),
            TurnEvent::Error { message } => {
                return Err(RelayError::Provider {
                    provider: self.provider.clone(),
                    message: if message.is_empty() {
                        "stream error".to_string()
                    } else {
                        message
                    },
                })
            }
            TurnEvent::Other => trace!("ignored turn event"),
        }
        Ok(Flow::Continue)
    }

    fn item_added(&mut self, item: OutputItem) {
        match item {
            OutputItem::Message { ref id, .. } => {
                let agent = item.agent_name();
                self.enter_message(Some(id.as_str()), agent);
            }
            OutputItem::FunctionCall { call_id, name, .. } => {
                self.emitter.emit(
                    RunEventStream::Tool,
                    RunEventPayload::ToolCallStarted { call_id, name },
                );
            }
            OutputItem::WorkflowAction { action_id, status } => {
                self.emitter.emit(
                    RunEventStream::Activity,
                    RunEventPayload::WorkflowAction {
                        action_id,
                        status,
                        done: false,
                    },
                );
            }
            OutputItem::Other => trace!("ignored output item"),
        }
    }

    fn item_done(&mut self, item: OutputItem) {
        if let Some(call) = item.completed_call() {
            if !self.seen_calls.insert(call.call_id.clone()) {
                warn!(call_id = %call.call_id, "duplicate completed call ignored");
                return;
            }
            self.emitter.emit(
                RunEventStream::Tool,
                RunEventPayload::ToolCallCompleted { call: call.clone() },
            );
            self.outcome.pending_calls.push(call);
            return;
        }

        match item {
            OutputItem::FunctionCall { call_id, status, .. } => {
                debug!(%call_id, status = status.as_deref().unwrap_or("none"), "call not completed; skipped");
            }
            OutputItem::WorkflowAction { action_id, status } => {
                self.emitter.emit(
                    RunEventStream::Activity,
                    RunEventPayload::WorkflowAction {
                        action_id,
                        status,
                        done: true,
                    },
                );
            }
            OutputItem::Message { .. } => {}
            OutputItem::Other => trace!("ignored output item"),
        }
    }

    /// Start a new assistant message when `id` differs from the current one.
    fn enter_message(&mut self, id: Option<&str>, agent: Option<String>) {
        let is_new = match (id, self.current_message_id.as_deref()) {
            (Some(id), Some(current)) => id != current,
            (Some(_), None) => true,
            // Anonymous text continues whatever message is open.
            (None, Some(_)) => false,
            (None, None) => true,
        };
        if !is_new {
            return;
        }

        self.current_message_id = Some(id.unwrap_or_default().to_string());
        self.saw_delta = false;
        self.outcome.text.clear();
        let header = agent
            .map(|name| name.to_uppercase())
            .unwrap_or_else(|| DEFAULT_AGENT_HEADER.to_string());
        self.emitter.emit(
            RunEventStream::Assistant,
            RunEventPayload::MessageStarted { agent: header },
        );
    }

    fn failure(&self, response: &TurnSummary) -> RelayError {
        let message = response
            .error
            .as_ref()
            .map(|e| match &e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message.clone(),
            })
            .unwrap_or_else(|| "turn failed".to_string());
        RelayError::Provider {
            provider: self.provider.clone(),
            message,
        }
    }
}
