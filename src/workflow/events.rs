//! Events and outputs of a workflow run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Callback receiving workflow events as they happen.
pub type WorkflowEventSink = Arc<dyn Fn(WorkflowEvent) + Send + Sync>;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(tag = "phase", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    Running { executor_id: String },
    Completed,
}

/// How a terminal output came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputKind {
    /// An executor yielded it.
    Final,
    /// An executor's preconditions or its agent's result contract failed.
    Diagnostic,
}

/// The user-visible result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub text: String,
    pub kind: OutputKind,
    /// Executor that produced the output.
    pub executor_id: String,
    /// Executor ids in the order they ran.
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// Phase change, or a progress note from the running executor.
    Status {
        phase: RunPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    ExecutorStarted {
        executor_id: String,
    },
    ExecutorCompleted {
        executor_id: String,
        /// Where the run goes next, if anywhere.
        next: Option<String>,
    },
    Output {
        output: WorkflowOutput,
    },
    Failed {
        error: String,
        cancelled: bool,
    },
}
