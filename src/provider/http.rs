//! Shared HTTP client and auth utilities.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};

use crate::error::RelayError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No overall request timeout: turn streams stay open for as long as the
/// remote side works, and the dispatch loop bounds each turn itself.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Build default headers for a Bearer-token streaming API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Turn a non-success response into an error, reading its body.
///
/// A `Retry-After` header (seconds) wins over a `retry_after` in the body.
pub async fn error_from_response(resp: reqwest::Response) -> RelayError {
    let status = resp.status().as_u16();
    let header_retry = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(seconds_to_ms);
    let body = resp.text().await.unwrap_or_default();
    match status_to_error(status, &body) {
        RelayError::RateLimited { retry_after_ms } => RelayError::RateLimited {
            retry_after_ms: header_retry.or(retry_after_ms),
        },
        other => other,
    }
}

/// Map a non-success HTTP status and its body to an error.
///
/// JSON bodies of the form `{"error": {"message": ..}}` are reduced to the message.
pub fn status_to_error(status: u16, body: &str) -> RelayError {
    let error = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());
    let message = error
        .as_ref()
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or(body)
        .to_string();

    match status {
        401 | 403 => RelayError::Authentication(message),
        429 => RelayError::RateLimited {
            retry_after_ms: error
                .as_ref()
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(seconds_to_ms),
        },
        _ => RelayError::api(status, message),
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0) as u64
}
