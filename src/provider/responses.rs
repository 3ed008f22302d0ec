//! Responses-style streaming endpoint hosting named workflow agents.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{bearer_headers, error_from_response, shared_client};
use super::sse::{SseDecoder, SseFrame};
use super::{ConversationProvider, TurnStream};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::types::{TurnEvent, TurnRequest};

/// Metadata flag asking the remote side for verbose workflow diagnostics.
pub const DEBUG_MODE_KEY: &str = "x-ms-debug-mode-enabled";

pub struct ResponsesProvider {
    api_key: String,
    base_url: String,
    debug_mode: bool,
}

impl ResponsesProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            debug_mode: false,
        }
    }

    /// Build from configuration; both the key and the endpoint are required.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RelayError::Authentication("Missing RELAY_API_KEY".into()))?;
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| RelayError::Configuration("Missing RELAY_BASE_URL".into()))?;
        Ok(Self::new(api_key, base_url).with_debug_mode(config.debug_mode))
    }

    pub fn with_debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    fn build_body(&self, request: &TurnRequest) -> TurnRequest {
        let mut body = request.clone();
        body.stream = true;
        if self.debug_mode {
            body.metadata.insert(DEBUG_MODE_KEY.to_string(), "1".to_string());
        }
        body
    }
}

#[derive(Deserialize)]
struct ConversationCreated {
    id: String,
}

#[async_trait]
impl ConversationProvider for ResponsesProvider {
    fn provider_name(&self) -> &str {
        "responses"
    }

    async fn open_turn(&self, request: &TurnRequest) -> Result<TurnStream, RelayError> {
        let body = self.build_body(request);
        let url = format!("{}/responses", self.base_url);

        debug!(
            conversation_id = %request.conversation_id,
            agent = %request.agent.name,
            outputs = request.input.is_function_outputs(),
            "Responses open_turn"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        if resp.status().as_u16() != 200 {
            return Err(error_from_response(resp).await);
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            futures::pin_mut!(byte_stream);

            'read: while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(RelayError::Network(e));
                        break 'read;
                    }
                };

                for frame in decoder.push(&chunk) {
                    match frame {
                        SseFrame::Done => break 'read,
                        SseFrame::Data(data) => match serde_json::from_str::<TurnEvent>(&data) {
                            Ok(event) => yield Ok(event),
                            Err(e) => {
                                warn!(error = %e, data = %data, "Responses SSE parse failed");
                                yield Err(malformed_event(&e));
                                break 'read;
                            }
                        },
                    }
                }
            }

            if let Some(SseFrame::Data(data)) = decoder.finish() {
                match serde_json::from_str::<TurnEvent>(&data) {
                    Ok(event) => yield Ok(event),
                    Err(e) => yield Err(malformed_event(&e)),
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn create_conversation(&self) -> Result<String, RelayError> {
        let url = format!("{}/conversations", self.base_url);
        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let created: ConversationCreated = resp.json().await?;
        debug!(conversation_id = %created.id, "conversation created");
        Ok(created.id)
    }
}

/// A payload that is not a well-formed event fails the turn instead of vanishing.
fn malformed_event(err: &serde_json::Error) -> RelayError {
    RelayError::Stream(format!("malformed event payload: {err}"))
}
