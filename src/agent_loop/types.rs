//! Core run types for the dispatch loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::types::Usage;

/// Unique run identifier.
pub type RunId = Uuid;

/// Limits applied to one dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopPolicy {
    /// Turns allowed before the run fails with `LoopBudgetExceeded`.
    pub max_turns: usize,
    /// Upper bound on one turn, from submission to its completion event.
    pub turn_timeout: Duration,
    /// Extra attempts for a turn that failed transiently.
    pub transient_retries: u32,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

impl LoopPolicy {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            max_turns: config.max_turns,
            turn_timeout: config.turn_timeout(),
            transient_retries: config.transient_retries,
        }
    }
}

/// Outcome of a dispatch run that reached a turn with no pending calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run_id: RunId,
    /// Turns submitted, counting the final one.
    pub turns: usize,
    /// Local tool executions across all turns.
    pub tool_calls: usize,
    /// Text of the last assistant message.
    pub final_text: String,
    pub usage: Usage,
}
