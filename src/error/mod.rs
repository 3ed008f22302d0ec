//! Error types for relay.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// The turn stream broke off before the remote side finished the turn.
    #[error("Stream error: {0}")]
    Stream(String),

    /// The remote side reported that the turn itself failed.
    #[error("Provider error: {provider} — {message}")]
    Provider { provider: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid arguments for {tool_name}: {message}")]
    ArgumentError { tool_name: String, message: String },

    #[error("Tool execution error: {tool_name} — {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Loop budget exceeded: remote side still requesting calls after {max_turns} turns")]
    LoopBudgetExceeded { max_turns: usize },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl RelayError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an argument error for a tool.
    pub fn arguments(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArgumentError {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a contract violation.
    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) | Self::Stream(_) | Self::Io(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Provider { .. } => ErrorCategory::Api,
            Self::UnknownTool(_) | Self::DuplicateTool(_) | Self::ArgumentError { .. } => {
                ErrorCategory::ToolDispatch
            }
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::ContractViolation(_) => ErrorCategory::Contract,
            Self::LoopBudgetExceeded { .. } => ErrorCategory::Budget,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::InvalidWorkflow(_) => ErrorCategory::Workflow,
            Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is a transient transport failure worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }

    /// Whether this error ends the surrounding run.
    ///
    /// Tool execution failures are reported back to the remote side as a
    /// regular output; everything else stops the run.
    pub fn is_fatal_to_run(&self) -> bool {
        !matches!(self, Self::ToolExecution { .. })
    }

    /// Whether this is a cooperative abort rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::RateLimit => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Network => RecoverySuggestion::RetryOnce,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::ToolDispatch => RecoverySuggestion::CheckToolRegistry,
            ErrorCategory::ToolExecution => RecoverySuggestion::CheckToolImplementation,
            ErrorCategory::Contract | ErrorCategory::Budget => {
                RecoverySuggestion::CheckAgentInstructions
            }
            ErrorCategory::Workflow => RecoverySuggestion::FixWorkflowDefinition,
            ErrorCategory::Cancelled => RecoverySuggestion::None,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RelayError>;
