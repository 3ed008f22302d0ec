//! Convenience re-exports for common use.

pub use crate::agent::{RemoteAgent, StructuredResult};
pub use crate::agent_loop::{DispatchLoop, DispatchRequest, LoopPolicy, RunEvent, RunSummary};
pub use crate::config::RelayConfig;
pub use crate::error::{RelayError, Result};
pub use crate::provider::{ConversationProvider, ResponsesProvider};
pub use crate::tools::{AgentTool, FunctionRegistry, Tool, ToolArguments, ToolParameters};
pub use crate::types::{FunctionCallOutput, FunctionCallRequest, TurnEvent, TurnRequest, Usage};
pub use crate::workflow::{
    Executor, Next, RunOptions, Workflow, WorkflowBuilder, WorkflowContext, WorkflowEvent,
    WorkflowOutput,
};
