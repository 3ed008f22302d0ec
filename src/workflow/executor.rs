//! Graph nodes: one unit of work on the shared run state.

use async_trait::async_trait;

use super::context::WorkflowContext;
use crate::error::RelayError;

/// Routing decision returned by an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Forward along the executor's only outgoing edge.
    Continue,
    /// Forward along the configured edge to this executor.
    Goto(String),
    /// End the run with this user-visible output.
    Yield(String),
}

/// One step of a workflow.
///
/// The state is lent for the duration of `handle` only; executors keep no
/// reference to it between invocations.
#[async_trait]
pub trait Executor<S: Send>: Send + Sync {
    /// Stable id, unique within a workflow.
    fn id(&self) -> &str;

    /// Do this step's work on `state` and pick where the run goes next.
    ///
    /// Returning [`RelayError::ContractViolation`] ends the run with a
    /// diagnostic output instead of an error.
    async fn handle(&self, state: &mut S, ctx: &mut WorkflowContext) -> Result<Next, RelayError>;
}
