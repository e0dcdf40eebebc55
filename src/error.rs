//! Error types for backend calls and widget operations.

use thiserror::Error;

/// Text shown when a failed prompt carries no server-supplied message.
pub const GENERIC_FAILURE: &str = "Failed to process your request";

/// Errors raised while talking to the agent backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid backend URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no error message"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the response body, if any.
        message: Option<String>,
    },
}

impl ApiError {
    /// The message the backend supplied in its error body, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    /// Text suitable for a user-facing system message.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.server_message().unwrap_or(GENERIC_FAILURE)
    }
}

/// Reasons a submission is refused before any network call is made.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The prompt was empty after trimming.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// Another submission is still in flight.
    #[error("a submission is already in flight")]
    Busy,
}

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, ApiError>;
