//! Error classification and recovery.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    /// Remote side asked for a tool that is not registered, or sent bad arguments.
    ToolDispatch,
    /// A tool ran and reported a domain failure.
    ToolExecution,
    /// A structured result or workflow precondition was not satisfied.
    Contract,
    /// The remote side kept requesting calls past the turn budget.
    Budget,
    Cancelled,
    Workflow,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    RetryOnce,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    CheckToolRegistry,
    CheckAgentInstructions,
    CheckToolImplementation,
    FixWorkflowDefinition,
    None,
    ContactSupport,
}
