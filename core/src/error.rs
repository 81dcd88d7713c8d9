//! Error types for the API client.
//!
//! # Design
//! The JSON shape of an error response is inspected exactly once, when the
//! response is parsed, and stored as an [`ErrorBody`]. The status code picks
//! the [`ApiError`] variant so callers can match on validation, conflict,
//! authentication and not-found failures without looking at raw numbers.
//! Failures that never reached the server (`Network`) or were abandoned on
//! purpose (`Cancelled`) carry no status.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::types::ValidationError;

/// Parsed body of a non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorBody {
    /// `{"detail": "..."}`
    Detail(String),
    /// `{"detail": [{"loc": [...], "msg": "...", "type": "..."}, ...]}`
    Validation(Vec<ValidationError>),
    /// Empty, not JSON, or a shape without a usable `detail`.
    #[default]
    Empty,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return ErrorBody::Empty;
        };
        match value.get("detail") {
            Some(Value::String(detail)) => ErrorBody::Detail(detail.clone()),
            Some(detail @ Value::Array(_)) => serde_json::from_value(detail.clone())
                .map(ErrorBody::Validation)
                .unwrap_or(ErrorBody::Empty),
            _ => ErrorBody::Empty,
        }
    }

    /// Headline message: the detail string, or the first validation message.
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorBody::Detail(detail) => Some(detail),
            ErrorBody::Validation(errors) => errors.first().map(|e| e.msg.as_str()),
            ErrorBody::Empty => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.write_str(message),
            None => f.write_str("no detail"),
        }
    }
}

/// Errors returned by API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 422: the server rejected one or more fields.
    #[error("validation failed: {body}")]
    Validation { body: ErrorBody },

    /// 400 or 409: a domain rule was violated (duplicate email, wrong
    /// password, bad credentials).
    #[error("HTTP {status}: {body}")]
    Conflict { status: u16, body: ErrorBody },

    /// 401: the token is missing, expired or revoked.
    #[error("not authenticated: {body}")]
    Unauthorized { body: ErrorBody },

    /// 403: authenticated but not allowed.
    #[error("forbidden: {body}")]
    Forbidden { body: ErrorBody },

    /// 404: the requested resource does not exist.
    #[error("resource not found: {body}")]
    NotFound { body: ErrorBody },

    /// Any other non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: ErrorBody },

    /// No response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A 2xx body did not match the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Map a non-2xx status and its parsed body to a variant.
    pub fn from_status(status: u16, body: ErrorBody) -> Self {
        match status {
            400 | 409 => ApiError::Conflict { status, body },
            401 => ApiError::Unauthorized { body },
            403 => ApiError::Forbidden { body },
            404 => ApiError::NotFound { body },
            422 => ApiError::Validation { body },
            _ => ApiError::Http { status, body },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { .. } => Some(422),
            ApiError::Conflict { status, .. } | ApiError::Http { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Network(_)
            | ApiError::Cancelled
            | ApiError::Serialization(_)
            | ApiError::Deserialization(_) => None,
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Validation { body }
            | ApiError::Conflict { body, .. }
            | ApiError::Unauthorized { body }
            | ApiError::Forbidden { body }
            | ApiError::NotFound { body }
            | ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
