//! Remote conversation provider trait and the HTTP implementation.

pub mod http;
pub mod responses;
pub mod sse;

pub use responses::ResponsesProvider;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::RelayError;
use crate::types::{TurnEvent, TurnRequest};

/// Event stream of one open turn.
pub type TurnStream = BoxStream<'static, Result<TurnEvent, RelayError>>;

/// The remote side of a conversation: opens turns and streams their events back.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    /// Provider name used in logs and errors.
    fn provider_name(&self) -> &str;

    /// Submit one turn and return its event stream.
    async fn open_turn(&self, request: &TurnRequest) -> Result<TurnStream, RelayError>;

    /// Start a conversation and return its id.
    async fn create_conversation(&self) -> Result<String, RelayError> {
        Ok(format!("conv_{}", uuid::Uuid::new_v4().simple()))
    }
}
