//! The tool-call dispatch loop.

use std::sync::Arc;

use bon::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::error::RelayError;
use crate::provider::ConversationProvider;
use crate::tools::FunctionRegistry;
use crate::types::{
    verify_outputs, AgentReference, FunctionCallOutput, TurnInput, TurnRequest, Usage,
};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

use super::events::{RunEventEmitter, RunEventPayload, RunEventSink, RunEventStream, RunLifecycle};
use super::monitor::{StreamMonitor, TurnOutcome};
use super::types::{LoopPolicy, RunId, RunSummary};

/// Metadata key carrying the per-turn idempotency token.
///
/// A retried turn resubmits the same token so the remote side can drop
/// outputs it already applied.
pub const REQUEST_ID_KEY: &str = "relay_request_id";

/// One conversation exchange to drive to completion.
#[derive(Debug, Clone, Builder)]
pub struct DispatchRequest {
    #[builder(into)]
    pub conversation_id: String,
    /// Name of the remote agent (or workflow agent) to address.
    #[builder(into)]
    pub agent: String,
    /// Initial user input.
    #[builder(into)]
    pub input: String,
    /// Named values the agent's instructions can reference.
    pub structured_inputs: Option<serde_json::Map<String, serde_json::Value>>,
    #[builder(default = Uuid::new_v4())]
    pub run_id: RunId,
}

/// Drives turns against a remote agent, executing requested calls locally
/// until a turn reports no pending calls.
#[derive(Clone)]
pub struct DispatchLoop {
    provider: Arc<dyn ConversationProvider>,
    registry: Arc<FunctionRegistry>,
    policy: LoopPolicy,
    sink: Option<RunEventSink>,
}

impl DispatchLoop {
    pub fn new(provider: Arc<dyn ConversationProvider>, registry: Arc<FunctionRegistry>) -> Self {
        Self {
            provider,
            registry,
            policy: LoopPolicy::default(),
            sink: None,
        }
    }

    pub fn with_policy(mut self, policy: LoopPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn provider(&self) -> &Arc<dyn ConversationProvider> {
        &self.provider
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &LoopPolicy {
        &self.policy
    }

    /// Run the exchange to completion.
    ///
    /// Fails with `LoopBudgetExceeded` when the remote side still requests
    /// calls after `max_turns` turns, and with `Cancelled` when `cancel`
    /// fires mid-stream or mid-tool-call.
    pub async fn run(
        &self,
        request: DispatchRequest,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, RelayError> {
        let emitter = RunEventEmitter::new(request.run_id, self.sink.clone());
        let span = info_span!(
            "dispatch",
            run_id = %request.run_id,
            conversation_id = %request.conversation_id,
            agent = %request.agent
        );

        emitter.lifecycle(RunLifecycle::Started);
        let result = self.drive(&request, &emitter, cancel).instrument(span).await;
        match &result {
            Ok(summary) => {
                debug!(run_id = %request.run_id, turns = summary.turns, tool_calls = summary.tool_calls, "dispatch completed");
                emitter.lifecycle(RunLifecycle::Completed);
            }
            Err(RelayError::Cancelled) => emitter.lifecycle(RunLifecycle::Canceled),
            Err(err) => emitter.lifecycle(RunLifecycle::Failed {
                error: err.to_string(),
            }),
        }
        result
    }

    async fn drive(
        &self,
        request: &DispatchRequest,
        emitter: &RunEventEmitter,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, RelayError> {
        let agent = AgentReference::new(&request.agent);
        let mut input = TurnInput::Text(request.input.clone());
        let mut usage = Usage::default();
        let mut tool_calls = 0usize;
        let mut turn = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }
            turn += 1;

            let resumed = input.is_function_outputs();
            let turn_request = TurnRequest::new(&request.conversation_id, agent.clone(), input)
                .with_structured_inputs(request.structured_inputs.clone())
                .with_metadata(REQUEST_ID_KEY, format!("{}:{turn}", request.run_id));

            emitter.lifecycle(RunLifecycle::TurnStarted { turn, resumed });
            debug!(turn, resumed, "submitting turn");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RelayError::Cancelled),
                outcome = self.submit_turn(&turn_request, turn, emitter) => outcome?,
            };

            if let Some(turn_usage) = &outcome.usage {
                usage.merge(turn_usage);
            }

            if outcome.pending_calls.is_empty() {
                return Ok(RunSummary {
                    run_id: request.run_id,
                    turns: turn,
                    tool_calls,
                    final_text: outcome.text,
                    usage,
                });
            }

            if turn >= self.policy.max_turns {
                return Err(RelayError::LoopBudgetExceeded {
                    max_turns: self.policy.max_turns,
                });
            }

            let outputs = self.dispatch_calls(&outcome, emitter, cancel).await?;
            tool_calls += outputs.len();
            verify_outputs(&outcome.pending_calls, &outputs)?;
            input = TurnInput::FunctionOutputs(outputs);
        }
    }

    /// One turn, retried on transient failure with the identical request.
    async fn submit_turn(
        &self,
        request: &TurnRequest,
        turn: usize,
        emitter: &RunEventEmitter,
    ) -> Result<TurnOutcome, RelayError> {
        RetryPolicy::transient(self.policy.transient_retries)
            .execute_with(
                move || {
                    with_timeout(self.policy.turn_timeout, async move {
                        let stream = self.provider.open_turn(request).await?;
                        StreamMonitor::new(self.provider.provider_name(), emitter)
                            .run(stream)
                            .await
                    })
                },
                |attempt, err| {
                    emitter.lifecycle(RunLifecycle::Retrying {
                        turn,
                        attempt,
                        error: err.to_string(),
                    })
                },
            )
            .await
    }

    /// Execute the turn's calls in order.
    ///
    /// Every call is resolved and validated before any of them runs, so an
    /// unknown tool or bad arguments abort the batch without side effects.
    async fn dispatch_calls(
        &self,
        outcome: &TurnOutcome,
        emitter: &RunEventEmitter,
        cancel: &CancellationToken,
    ) -> Result<Vec<FunctionCallOutput>, RelayError> {
        let prepared = outcome
            .pending_calls
            .iter()
            .map(|call| self.registry.prepare(call))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outputs = Vec::with_capacity(prepared.len());
        for call in prepared {
            let name = call.tool.name().to_string();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RelayError::Cancelled),
                result = call.execute() => result,
            };

            let (output, shown, is_error) = match result {
                Ok(value) => (FunctionCallOutput::new(&call.call_id, &value), value, false),
                Err(RelayError::ToolExecution { message, .. }) => {
                    debug!(call_id = %call.call_id, tool = %name, error = %message, "tool failed; reporting to remote side");
                    let output = FunctionCallOutput::error(&call.call_id, message.as_str());
                    (output, serde_json::Value::String(message), true)
                }
                Err(err) => return Err(err),
            };

            debug!(call_id = %call.call_id, tool = %name, is_error, "tool executed");
            emitter.emit(
                RunEventStream::Tool,
                RunEventPayload::ToolResult {
                    call_id: call.call_id.clone(),
                    name,
                    output: shown,
                    is_error,
                },
            );
            outputs.push(output);
        }
        Ok(outputs)
    }
}

impl std::fmt::Debug for DispatchLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchLoop")
            .field("provider", &self.provider.provider_name())
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .finish()
    }
}
