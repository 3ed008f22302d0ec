//! Workflow graphs: executors over shared state, connected by static edges.

pub mod builder;
pub mod clarify;
pub mod context;
pub mod events;
pub mod executor;
pub mod graph;

pub use builder::WorkflowBuilder;
pub use clarify::{clarify, Clarified, Clarifier, ScriptedClarifier};
pub use context::{RunOptions, WorkflowContext};
pub use events::{OutputKind, RunPhase, WorkflowEvent, WorkflowEventSink, WorkflowOutput};
pub use executor::{Executor, Next};
pub use graph::{StateFactory, Workflow};
