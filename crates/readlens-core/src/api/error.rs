use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - credential expired")]
    CredentialExpired,

    #[error("Credential refresh failed: {0}")]
    RefreshInvalid(String),

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Readable message from an error body.
    ///
    /// The server reports failures as `{"detail": "..."}`, or for validation
    /// failures `{"detail": [{"msg": "...", ...}, ...]}`. Anything else is
    /// returned as (truncated) text.
    pub fn error_detail(body: &str) -> String {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned());

        match detail {
            Some(Value::String(message)) => Self::truncate_body(&message),
            Some(Value::Array(entries)) => {
                let messages: Vec<&str> = entries
                    .iter()
                    .filter_map(|e| e.get("msg").and_then(Value::as_str))
                    .collect();
                if messages.is_empty() {
                    Self::truncate_body(body)
                } else {
                    Self::truncate_body(&messages.join("; "))
                }
            }
            _ => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = Self::error_detail(body);
        match status.as_u16() {
            401 => ApiError::CredentialExpired,
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// Classify a failed login or register response. Client errors mean the
    /// input was rejected; server errors are reported as such.
    pub fn from_auth_status(status: StatusCode, body: &str) -> Self {
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            ApiError::AuthRejected(Self::error_detail(body))
        } else {
            Self::from_status(status, body)
        }
    }

    /// True when the caller has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::SessionExpired | ApiError::CredentialExpired)
    }
}
