//! Run event stream types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{FunctionCallRequest, Usage};

use super::types::RunId;

/// Callback used for streaming run events.
pub type RunEventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Stream category for events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunEventStream {
    Lifecycle,
    Assistant,
    Activity,
    Tool,
}

/// Run lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RunLifecycle {
    Started,
    TurnStarted { turn: usize, resumed: bool },
    Retrying { turn: usize, attempt: u32, error: String },
    Completed,
    Failed { error: String },
    Canceled,
}

/// Concrete event payloads emitted by the dispatch loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventPayload {
    Lifecycle {
        state: RunLifecycle,
    },
    /// A new assistant message begins; `agent` is the display header.
    MessageStarted {
        agent: String,
    },
    AssistantDelta {
        text: String,
    },
    Activity {
        text: String,
    },
    WorkflowAction {
        action_id: String,
        status: Option<String>,
        done: bool,
    },
    ToolCallStarted {
        call_id: String,
        name: String,
    },
    ToolCallCompleted {
        call: FunctionCallRequest,
    },
    ToolResult {
        call_id: String,
        name: String,
        output: serde_json::Value,
        is_error: bool,
    },
    Usage {
        usage: Usage,
    },
}

/// Envelope for streaming run events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub stream: RunEventStream,
    pub payload: RunEventPayload,
}

/// Stamps payloads with run id and sequence number and hands them to the sink.
///
/// Clones share the sequence counter.
#[derive(Clone)]
pub struct RunEventEmitter {
    run_id: RunId,
    seq: Arc<AtomicU64>,
    sink: Option<RunEventSink>,
}

impl RunEventEmitter {
    pub fn new(run_id: RunId, sink: Option<RunEventSink>) -> Self {
        Self {
            run_id,
            seq: Arc::new(AtomicU64::new(1)),
            sink,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn emit(&self, stream: RunEventStream, payload: RunEventPayload) {
        let Some(sink) = &self.sink else { return; };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(RunEvent {
            run_id: self.run_id,
            seq,
            timestamp: Utc::now(),
            stream,
            payload,
        });
    }

    pub fn lifecycle(&self, state: RunLifecycle) {
        self.emit(RunEventStream::Lifecycle, RunEventPayload::Lifecycle { state });
    }
}

impl std::fmt::Debug for RunEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunEventEmitter")
            .field("run_id", &self.run_id)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
