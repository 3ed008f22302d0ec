//! Typed results parsed from an agent's final message.

use serde::de::DeserializeOwned;

use crate::error::RelayError;

/// A closed record an agent returns as JSON in its final message.
///
/// Implementors reject unknown fields and require every field, so a reply
/// that does not match the record is a [`RelayError::ContractViolation`].
pub trait StructuredResult: DeserializeOwned + Send + Sync + 'static {
    /// Record name used in diagnostics.
    const NAME: &'static str;

    /// Whether the agent considers its step finished.
    fn is_complete(&self) -> bool;

    /// Text meant for the user, possibly empty.
    fn user_message(&self) -> &str;
}

/// Parse `text` as `T`, tolerating a Markdown code fence or prose around the
/// JSON object.
pub fn parse_structured<T: StructuredResult>(text: &str) -> Result<T, RelayError> {
    let json = extract_object(text).ok_or_else(|| {
        RelayError::contract(format!("{} expected a JSON object, got {:?}", T::NAME, truncate(text)))
    })?;
    serde_json::from_str(json)
        .map_err(|err| RelayError::contract(format!("{} does not match its contract: {err}", T::NAME)))
}

fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(80) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
