//! Error type shared by every backend call

use serde_json::Value;
use thiserror::Error;

/// Fallback text when an error carries nothing readable
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

/// Failure of a single request against the catalog backend.
///
/// `Clone` because one in-flight read is shared by every reader of the same
/// cache identity.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: Value },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Best-effort human readable text for notifications.
    ///
    /// Tries, in order: a plain string body, an object's `message` field,
    /// an object's `error` field, then the error's own text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { body, .. } => message_from_body(body)
                .unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
            Self::Transport(msg) | Self::Unauthorized(msg) | Self::Decode(msg) | Self::InvalidRequest(msg)
                if !msg.trim().is_empty() =>
            {
                msg.clone()
            }
            _ => UNEXPECTED_ERROR.to_string(),
        }
    }
}

/// Pull a readable message out of an error body
pub fn message_from_body(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => ["message", "error"].iter().find_map(|field| {
            match map.get(*field) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::String(_)) | Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            }
        }),
        _ => None,
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
