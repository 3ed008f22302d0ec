//! Running a built workflow.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info_span, Instrument};

use super::context::{RunOptions, WorkflowContext};
use super::events::{OutputKind, RunPhase, WorkflowEvent, WorkflowOutput};
use super::executor::{Executor, Next};
use crate::error::RelayError;

/// Creates a run's state from its initial input.
pub type StateFactory<S> = Arc<dyn Fn(&str) -> S + Send + Sync>;

struct Graph<S: Send> {
    executors: HashMap<String, Arc<dyn Executor<S>>>,
    edges: HashMap<String, Vec<String>>,
    start: String,
    state_factory: StateFactory<S>,
}

/// A validated, immutable executor graph. Cheap to clone; every run owns
/// its own state.
pub struct Workflow<S: Send> {
    graph: Arc<Graph<S>>,
}

impl<S: Send> Clone for Workflow<S> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
        }
    }
}

impl<S: Send + 'static> Workflow<S> {
    pub(crate) fn from_parts(
        executors: HashMap<String, Arc<dyn Executor<S>>>,
        edges: HashMap<String, Vec<String>>,
        start: String,
        state_factory: StateFactory<S>,
    ) -> Self {
        Self {
            graph: Arc::new(Graph {
                executors,
                edges,
                start,
                state_factory,
            }),
        }
    }

    pub fn start_id(&self) -> &str {
        &self.graph.start
    }

    /// Outgoing edges of `id`, in the order they were added.
    pub fn successors(&self, id: &str) -> &[String] {
        self.graph.edges.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Run the graph once from the start executor.
    ///
    /// A contract violation inside an executor ends the run with a
    /// [`OutputKind::Diagnostic`] output. Any other executor error, including
    /// cancellation, is reported as a `Failed` event and returned.
    pub async fn run(&self, input: &str, options: RunOptions) -> Result<WorkflowOutput, RelayError> {
        let mut ctx = WorkflowContext::new(options);
        let span = info_span!(
            "workflow",
            run_id = %ctx.run_id(),
            conversation_id = %ctx.conversation_id()
        );

        let mut steps = Vec::new();
        let result = self.execute(input, &mut ctx, &mut steps).instrument(span).await;

        let output = match result {
            Ok(output) => output,
            Err(RelayError::ContractViolation(message)) => {
                debug!(run_id = %ctx.run_id(), executor = %ctx.executor_id(), %message, "contract violation");
                ctx.emit(WorkflowEvent::ExecutorCompleted {
                    executor_id: ctx.executor_id().to_string(),
                    next: None,
                });
                WorkflowOutput {
                    text: format!("Error: {message}"),
                    kind: OutputKind::Diagnostic,
                    executor_id: ctx.executor_id().to_string(),
                    steps,
                }
            }
            Err(err) => {
                ctx.emit(WorkflowEvent::Failed {
                    error: err.to_string(),
                    cancelled: err.is_cancelled(),
                });
                return Err(err);
            }
        };

        ctx.emit(WorkflowEvent::Output {
            output: output.clone(),
        });
        ctx.emit(WorkflowEvent::Status {
            phase: RunPhase::Completed,
            message: None,
        });
        Ok(output)
    }

    /// Run the graph on a background task and stream its events.
    ///
    /// The stream ends after the `Output` and final `Status` events, or after
    /// `Failed`. Any sink set on `options` still receives every event.
    pub fn run_stream(&self, input: impl Into<String>, options: RunOptions) -> BoxStream<'static, WorkflowEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let forward = options.sink.clone();
        let options = RunOptions {
            sink: Some(Arc::new(move |event: WorkflowEvent| {
                if let Some(sink) = &forward {
                    (sink)(event.clone());
                }
                let _ = tx.send(event);
            })),
            ..options
        };

        let workflow = self.clone();
        let input = input.into();
        tokio::spawn(async move {
            // Errors already went out as a Failed event.
            let _ = workflow.run(&input, options).await;
        });

        UnboundedReceiverStream::new(rx).boxed()
    }

    async fn execute(
        &self,
        input: &str,
        ctx: &mut WorkflowContext,
        steps: &mut Vec<String>,
    ) -> Result<WorkflowOutput, RelayError> {
        let graph = &self.graph;
        let mut state = (graph.state_factory)(input);
        let mut current = graph.start.clone();

        loop {
            ctx.check_cancelled()?;
            let executor = graph
                .executors
                .get(&current)
                .ok_or_else(|| RelayError::InvalidState(format!("executor '{current}' vanished")))?;

            ctx.enter(&current);
            steps.push(current.clone());
            ctx.emit(WorkflowEvent::Status {
                phase: RunPhase::Running {
                    executor_id: current.clone(),
                },
                message: None,
            });
            ctx.emit(WorkflowEvent::ExecutorStarted {
                executor_id: current.clone(),
            });
            debug!(executor = %current, "executor started");

            let next = executor.handle(&mut state, ctx).await?;
            let targets = self.successors(&current);

            let destination = match next {
                Next::Yield(text) => {
                    ctx.emit(WorkflowEvent::ExecutorCompleted {
                        executor_id: current.clone(),
                        next: None,
                    });
                    return Ok(WorkflowOutput {
                        text,
                        kind: OutputKind::Final,
                        executor_id: current,
                        steps: steps.clone(),
                    });
                }
                Next::Continue => match targets {
                    [only] => only.clone(),
                    [] => {
                        return Err(RelayError::InvalidState(format!(
                            "executor '{current}' continued but has no outgoing edge"
                        )))
                    }
                    _ => {
                        return Err(RelayError::InvalidState(format!(
                            "executor '{current}' continued but has {} outgoing edges",
                            targets.len()
                        )))
                    }
                },
                Next::Goto(target) => {
                    if !targets.contains(&target) {
                        return Err(RelayError::InvalidState(format!(
                            "no edge from '{current}' to '{target}'"
                        )));
                    }
                    target
                }
            };

            ctx.emit(WorkflowEvent::ExecutorCompleted {
                executor_id: current.clone(),
                next: Some(destination.clone()),
            });
            current = destination;
        }
    }
}
