//! Wire types for the agent backend's HTTP endpoints.
//!
//! These mirror the JSON bodies of `POST /api/prompt` and `GET /api/status`.

use serde::{Deserialize, Serialize};

// =============================================================================
// Prompt API Types
// =============================================================================

/// Body of `POST /api/prompt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptRequest {
    /// The trimmed user prompt.
    pub prompt: String,
}

/// Successful reply from `POST /api/prompt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptResponse {
    /// Assistant reply, possibly markdown.
    pub response: String,
    /// Backend-measured processing time. The backend sends it as a
    /// preformatted string, but numbers are accepted too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<serde_json::Value>,
}

/// Error body returned with a non-success status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human readable error text.
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Status API Types
// =============================================================================

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    #[serde(default)]
    pub crypto_connected: bool,
    #[serde(default)]
    pub binance_connected: bool,
    #[serde(default)]
    pub openai_connected: bool,
    #[serde(default)]
    pub crypto_tools_count: u32,
    #[serde(default)]
    pub binance_tools_count: u32,
    /// Model the backend's agent loop runs on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_response_accepts_string_processing_time() {
        let body = json!({ "response": "**hi**", "processing_time": "1.25" });
        let parsed: PromptResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.response, "**hi**");
        assert_eq!(parsed.processing_time, Some(json!("1.25")));
    }

    #[test]
    fn status_defaults_missing_fields() {
        let parsed: StatusResponse =
            serde_json::from_value(json!({ "crypto_connected": true })).unwrap();
        assert!(parsed.crypto_connected);
        assert!(!parsed.binance_connected);
        assert_eq!(parsed.binance_tools_count, 0);
        assert_eq!(parsed.llm_model, None);
    }

    #[test]
    fn error_body_tolerates_missing_error() {
        let parsed: ErrorBody = serde_json::from_value(json!({ "detail": "x" })).unwrap();
        assert_eq!(parsed.error, None);
    }
}
