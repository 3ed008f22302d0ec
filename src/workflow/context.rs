//! Per-run context handed to executors.

use std::sync::Arc;

use bon::Builder;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::clarify::Clarifier;
use super::events::{RunPhase, WorkflowEvent, WorkflowEventSink};
use crate::agent_loop::RunId;
use crate::error::RelayError;

/// Caller-supplied options for one run.
#[derive(Clone, Builder, Default)]
pub struct RunOptions {
    /// Conversation the remote agents share; minted locally when absent.
    #[builder(into)]
    pub conversation_id: Option<String>,
    pub cancel: Option<CancellationToken>,
    pub clarifier: Option<Arc<dyn Clarifier>>,
    pub sink: Option<WorkflowEventSink>,
}

/// What an executor can see and do beyond the state.
pub struct WorkflowContext {
    run_id: RunId,
    conversation_id: String,
    cancel: CancellationToken,
    clarifier: Option<Arc<dyn Clarifier>>,
    sink: Option<WorkflowEventSink>,
    executor_id: String,
}

impl WorkflowContext {
    pub fn new(options: RunOptions) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            conversation_id: options
                .conversation_id
                .unwrap_or_else(|| format!("conv_{}", Uuid::new_v4().simple())),
            cancel: options.cancel.unwrap_or_default(),
            clarifier: options.clarifier,
            sink: options.sink,
            executor_id: String::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fail with [`RelayError::Cancelled`] once the caller aborted the run.
    pub fn check_cancelled(&self) -> Result<(), RelayError> {
        if self.cancel.is_cancelled() {
            Err(RelayError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn clarifier(&self) -> Option<&Arc<dyn Clarifier>> {
        self.clarifier.as_ref()
    }

    /// Id of the executor currently running.
    pub fn executor_id(&self) -> &str {
        &self.executor_id
    }

    pub(crate) fn enter(&mut self, executor_id: &str) {
        self.executor_id = executor_id.to_string();
    }

    /// Report progress of the running executor.
    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(run_id = %self.run_id, executor = %self.executor_id, %message, "workflow status");
        self.emit(WorkflowEvent::Status {
            phase: RunPhase::Running {
                executor_id: self.executor_id.clone(),
            },
            message: Some(message),
        });
    }

    pub(crate) fn emit(&self, event: WorkflowEvent) {
        if let Some(sink) = &self.sink {
            (sink)(event);
        }
    }
}

impl std::fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("run_id", &self.run_id)
            .field("conversation_id", &self.conversation_id)
            .field("executor_id", &self.executor_id)
            .field("has_clarifier", &self.clarifier.is_some())
            .finish()
    }
}
