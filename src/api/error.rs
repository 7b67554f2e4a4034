//! Error types for the Pecha API

use thiserror::Error;

/// Errors that can occur when fetching content
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// The requested text or content does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request was superseded before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// Base URL could not be combined with the endpoint path
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ApiError {
    /// Check if this error is transient (a later scroll may retry the page)
    pub fn is_recoverable(&self) -> bool {
        match self {
            ApiError::RequestError(_) | ApiError::Cancelled => true,
            ApiError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_recoverable() {
        let err = ApiError::ApiError { status: 503, message: "busy".into() };
        assert!(err.is_recoverable());
    }

    #[test]
    fn client_errors_are_not_recoverable() {
        let err = ApiError::ApiError { status: 400, message: "bad".into() };
        assert!(!err.is_recoverable());
        assert!(!ApiError::NotFound("text".into()).is_recoverable());
    }

    #[test]
    fn error_messages_include_status() {
        let err = ApiError::ApiError { status: 418, message: "teapot".into() };
        assert_eq!(err.to_string(), "API error (418): teapot");
    }
}
