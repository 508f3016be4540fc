use std::collections::BTreeMap;

use thiserror::Error;

/// Field name to the messages reported for it, in the order the backend sent them.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Client-side validation failed; no request was sent.
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Backend {
        status: u16,
        message: String,
        field_errors: FieldErrors,
    },

    /// Credentials were rejected by the auth endpoint.
    #[error("{message}")]
    Auth {
        message: String,
        field_errors: FieldErrors,
    },

    /// The permission gate refused the action.
    #[error("{0}")]
    Forbidden(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Message suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Please correct the highlighted fields".to_string(),
            AppError::Network(_) => "Could not reach the server, please try again".to_string(),
            AppError::Timeout => "The server took too long to respond".to_string(),
            other => other.to_string(),
        }
    }

    /// Field level messages carried by the error, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            AppError::Backend { field_errors, .. } | AppError::Auth { field_errors, .. } => {
                Some(field_errors)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout
        } else if e.is_decode() {
            AppError::Decode(e.to_string())
        } else {
            AppError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
