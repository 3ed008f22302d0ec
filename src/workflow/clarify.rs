//! Bounded clarification rounds between an agent step and the user.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::context::WorkflowContext;
use crate::agent::{RemoteAgent, StructuredResult};
use crate::error::RelayError;

/// Supplies the user's reply when an agent step needs more input.
#[async_trait]
pub trait Clarifier: Send + Sync {
    /// Show `prompt` to the user and return their reply, or `None` if they gave up.
    async fn reply(&self, prompt: &str) -> Option<String>;
}

/// Replays canned replies in order, then gives up.
#[derive(Debug, Default)]
pub struct ScriptedClarifier {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClarifier {
    pub fn new<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Clarifier for ScriptedClarifier {
    async fn reply(&self, prompt: &str) -> Option<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies.lock().ok()?.pop_front()
    }
}

/// How a clarification loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Clarified<T> {
    /// The agent reported the step complete.
    Complete(T),
    /// No reply is available; `message` is the agent's last question.
    Stopped { message: String },
    /// Every round was used without the step completing.
    Exhausted { rounds: u32, last: T },
}

/// Invoke `agent` until its structured result reports completion.
///
/// After each incomplete round the context's clarifier is asked for the
/// user's reply, which becomes the next round's input. At most `max_rounds`
/// agent invocations happen.
pub async fn clarify<T: StructuredResult>(
    agent: &RemoteAgent,
    ctx: &WorkflowContext,
    input: String,
    structured_inputs: serde_json::Map<String, serde_json::Value>,
    max_rounds: u32,
) -> Result<Clarified<T>, RelayError> {
    let max_rounds = max_rounds.max(1);
    let mut input = input;
    let mut round = 0;

    loop {
        round += 1;
        ctx.check_cancelled()?;
        let result: T = agent
            .invoke_structured(
                ctx.conversation_id(),
                &input,
                Some(structured_inputs.clone()),
                ctx.cancel_token(),
            )
            .await?;

        if !result.user_message().is_empty() {
            ctx.status(format!("{}: {}", agent.name(), result.user_message()));
        }
        if result.is_complete() {
            return Ok(Clarified::Complete(result));
        }
        let Some(clarifier) = ctx.clarifier() else {
            return Ok(Clarified::Stopped {
                message: result.user_message().to_string(),
            });
        };
        if round == max_rounds {
            tracing::debug!(agent = %agent.name(), rounds = max_rounds, "clarification rounds exhausted");
            return Ok(Clarified::Exhausted {
                rounds: max_rounds,
                last: result,
            });
        }
        let reply = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => return Err(RelayError::Cancelled),
            reply = clarifier.reply(result.user_message()) => reply,
        };
        match reply {
            Some(reply) => input = reply,
            None => {
                return Ok(Clarified::Stopped {
                    message: result.user_message().to_string(),
                })
            }
        }
    }
}
