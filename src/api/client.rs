//! reqwest-backed client for the agent backend.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::api::types::{ErrorBody, PromptRequest, PromptResponse, StatusResponse};
use crate::api::ChatBackend;
use crate::error::{ApiError, Result};

/// HTTP client for the backend's `/api/prompt` and `/api/status` endpoints.
///
/// # Example
///
/// ```rust,no_run
/// use agent_chat_widget::api::{ChatBackend, HttpBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = HttpBackend::new("http://127.0.0.1:8000", None)?;
/// let reply = backend.send_prompt("What is BTC trading at?").await?;
/// println!("{}", reply.response);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the backend (e.g. "http://127.0.0.1:8000")
    /// * `timeout` - Per-request timeout; `None` waits indefinitely
    pub fn new(base_url: impl AsRef<str>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(base_url, builder.build()?)
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        // Endpoints are joined relatively so a path prefix survives.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, http })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            Ok(serde_json::from_slice(&body)?)
        } else {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            Err(ApiError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_prompt(&self, prompt: &str) -> Result<PromptResponse> {
        let req = PromptRequest {
            prompt: prompt.to_string(),
        };
        let response = self
            .http
            .post(self.url("api/prompt")?)
            .json(&req)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn fetch_status(&self) -> Result<StatusResponse> {
        let response = self.http.get(self.url("api/status")?).send().await?;
        Self::handle_response(response).await
    }
}
