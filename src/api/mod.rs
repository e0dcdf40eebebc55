//! Agent backend collaborator.
//!
//! The widget never talks HTTP directly; it goes through [`ChatBackend`] so
//! the transport can be swapped for an in-memory fake in tests.
//!
//! - [`types`]: request/response bodies
//! - [`client`]: the reqwest implementation

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::HttpBackend;
pub use types::{ErrorBody, PromptRequest, PromptResponse, StatusResponse};

/// The two backend endpoints the widget depends on.
#[async_trait]
pub trait ChatBackend: Send + Sync + std::fmt::Debug {
    /// `POST /api/prompt` with `{ "prompt": ... }`.
    async fn send_prompt(&self, prompt: &str) -> Result<PromptResponse>;

    /// `GET /api/status`.
    async fn fetch_status(&self) -> Result<StatusResponse>;
}
