//! A named remote agent driven through the dispatch loop.

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::structured::{parse_structured, StructuredResult};
use crate::agent_loop::{DispatchLoop, DispatchRequest, RunSummary};
use crate::error::RelayError;

/// Handle to one remote agent. Every invocation is a full dispatch run, so
/// tool calls the agent makes are executed before the invocation returns.
#[derive(Debug, Clone)]
pub struct RemoteAgent {
    name: String,
    dispatch: DispatchLoop,
}

impl RemoteAgent {
    pub fn new(name: impl Into<String>, dispatch: DispatchLoop) -> Self {
        Self {
            name: name.into(),
            dispatch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatch(&self) -> &DispatchLoop {
        &self.dispatch
    }

    /// Send `input` to the agent and wait for its final answer.
    pub async fn invoke(
        &self,
        conversation_id: &str,
        input: &str,
        structured_inputs: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, RelayError> {
        let request = DispatchRequest::builder()
            .conversation_id(conversation_id)
            .agent(self.name.as_str())
            .input(input)
            .maybe_structured_inputs(structured_inputs)
            .build();
        self.dispatch.run(request, cancel).await
    }

    /// Like [`invoke`](Self::invoke), then parse the final answer as `T`.
    pub async fn invoke_structured<T: StructuredResult>(
        &self,
        conversation_id: &str,
        input: &str,
        structured_inputs: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> Result<T, RelayError> {
        let summary = self
            .invoke(conversation_id, input, structured_inputs, cancel)
            .await?;
        debug!(agent = %self.name, result = T::NAME, turns = summary.turns, "parsing structured result");
        parse_structured(&summary.final_text)
    }
}
