//! Error types for the platform client core.
//!
//! # Design
//! Every failure a caller can see is an `ApiError`. HTTP rejections keep the
//! status code and the best human-readable message the classifier could
//! extract; transport failures carry the number of attempts that were made.
//! `ApiError::kind` projects all of them onto the closed `ErrorKind` set so
//! callers can branch without matching on variant payloads.

use std::fmt;

use thiserror::Error;

/// Closed classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    InternalServerError,
    ServiceUnavailable,
    /// No status code was received.
    ConnectionFailure,
    /// A status code outside the known table, or a client-side failure.
    Unclassified,
}

impl ErrorKind {
    /// Look a status code up in the fixed classification table.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            500 => ErrorKind::InternalServerError,
            503 => ErrorKind::ServiceUnavailable,
            _ => ErrorKind::Unclassified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InternalServerError => "InternalServerError",
            ErrorKind::ServiceUnavailable => "ServiceUnavailable",
            ErrorKind::ConnectionFailure => "ConnectionFailure",
            ErrorKind::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the executor, retry wrapper, pager and client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a status code outside {200, 201, 202, 204}.
    #[error("{message} (HTTP {status})")]
    Api {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    /// No response was received; `attempts` counts the tries made.
    #[error("connection failed after {attempts} attempt(s): {message}")]
    ConnectionFailure { attempts: u32, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A response body did not have the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request could not be built (bad path template, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client configuration was incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Api { kind, .. } => *kind,
            ApiError::ConnectionFailure { .. } => ErrorKind::ConnectionFailure,
            _ => ErrorKind::Unclassified,
        }
    }

    /// The status code, when the server sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The human-readable part of the error, without decoration.
    pub fn message(&self) -> String {
        match self {
            ApiError::Api { message, .. } | ApiError::ConnectionFailure { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ApiError::ConnectionFailure { .. })
    }
}
