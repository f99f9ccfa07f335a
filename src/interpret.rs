//! Classification of a finished transport attempt.
//!
//! The service answers every request on the same binary channel: a converted
//! document on success, and a JSON error document on failure. The transport
//! is told to expect bytes in both cases, so it cannot tell them apart. This
//! module is the one place that knows what a failure body looks like. The
//! controller only ever sees an [`Outcome`].
//!
//! ```text
//! Ok(bytes)                         ──▶ Success(bytes)
//! Err { body: Some(b), .. }
//!     b is UTF-8 JSON with "detail" ──▶ Failure(detail)
//!     anything else                 ──▶ Failure(GENERIC_FAILURE)
//! Err { body: None, message, .. }   ──▶ Failure(message or GENERIC_FAILURE)
//! ```

use crate::transport::{TransportError, TransportResult};
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

/// Message shown when the service's error body cannot be understood.
pub const GENERIC_FAILURE: &str = "Failed to convert file. Please try again.";

/// The two things a transport result can mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A converted document, byte-for-byte as received.
    Success(Bytes),
    /// A human-readable failure description.
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// The service's error document: `{"detail": "..."}`.
///
/// Request-validation failures use a list instead:
/// `{"detail": [{"loc": [...], "msg": "...", "type": "..."}]}`.
#[derive(Debug, Deserialize)]
struct ErrorDocument {
    detail: Detail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Validation(Vec<ValidationItem>),
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    msg: String,
}

/// Classify a transport result. Never panics; every failure becomes
/// [`Outcome::Failure`].
pub fn interpret(result: TransportResult) -> Outcome {
    match result {
        Ok(bytes) => Outcome::Success(bytes),
        Err(err) => Outcome::Failure(failure_message(&err)),
    }
}

/// Extract the message a user should see for a failed attempt.
pub fn failure_message(err: &TransportError) -> String {
    match err.body() {
        Some(body) => match message_from_body(body) {
            Some(msg) => msg,
            None => {
                debug!(
                    "Unrecognised error body ({} bytes, status {:?})",
                    body.len(),
                    err.status()
                );
                GENERIC_FAILURE.to_string()
            }
        },
        None => err
            .message()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
    }
}

/// Decode a failure body as UTF-8 JSON and pull out its `detail`.
fn message_from_body(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    let doc: ErrorDocument = serde_json::from_str(text).ok()?;
    match doc.detail {
        Detail::Message(msg) => Some(msg),
        Detail::Validation(items) => {
            let joined = items
                .into_iter()
                .map(|i| i.msg)
                .filter(|m| !m.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
    }
}
