//! Maps a rejected response onto an `ErrorKind` and a readable message.
//!
//! The platform's services disagree on how an error body looks. All of these
//! are seen in the wild and must be tolerated:
//!
//! - `{"message": "..."}`
//! - `{"cause": "..."}`
//! - `{"errors": [{"errorCode": "...", "errorMessage": "..."}]}`
//! - `{"NeutronError": {"message": "..."}}` (one wrapper key around a message)
//! - a bare JSON string
//!
//! Classification never fails. When nothing useful is found the HTTP reason
//! phrase is used, and failing that a generic placeholder.

use serde_json::Value;

use crate::error::{ApiError, ErrorKind};

pub const GENERIC_MESSAGE: &str = "Some error has occurred";

/// Result of classifying one rejected response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
}

impl From<Classification> for ApiError {
    fn from(c: Classification) -> Self {
        ApiError::Api {
            kind: c.kind,
            status: c.status,
            message: c.message,
        }
    }
}

/// Classify `status` and pull the best message out of `body`.
pub fn classify(status: u16, body: Option<&Value>) -> Classification {
    let message = body
        .and_then(extract_message)
        .or_else(|| reason_phrase(status).map(str::to_string))
        .unwrap_or_else(|| GENERIC_MESSAGE.to_string());
    Classification {
        kind: ErrorKind::from_status(status),
        status,
        message,
    }
}

/// Canonical reason phrase for a status code, if it has one.
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    ureq::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
}

fn extract_message(body: &Value) -> Option<String> {
    match body {
        Value::String(text) => non_blank(text),
        Value::Object(map) => {
            for key in ["message", "cause"] {
                if let Some(text) = map.get(key).and_then(Value::as_str).and_then(non_blank) {
                    return Some(text);
                }
            }
            if let Some(text) = map.get("errors").and_then(errors_message) {
                return Some(text);
            }
            // {"SomeFault": {"message": "..."}}
            if map.len() == 1 {
                if let Some(inner) = map.values().next().filter(|v| v.is_object()) {
                    return extract_message(inner);
                }
            }
            None
        }
        _ => None,
    }
}

fn errors_message(errors: &Value) -> Option<String> {
    let messages: Vec<String> = errors
        .as_array()?
        .iter()
        .filter_map(|entry| entry.get("errorMessage").and_then(Value::as_str))
        .filter_map(non_blank)
        .collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
