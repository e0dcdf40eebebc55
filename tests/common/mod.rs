//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agent_chat_widget::api::{ChatBackend, PromptResponse, StatusResponse};
use agent_chat_widget::error::{ApiError, Result};
use agent_chat_widget::markdown::CmarkRenderer;
use agent_chat_widget::widget::{ChatWidget, TranscriptView};
use async_trait::async_trait;
use tokio::sync::Notify;

/// Backend that replays queued results and counts calls.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    prompts: Mutex<VecDeque<Result<PromptResponse>>>,
    statuses: Mutex<VecDeque<Result<StatusResponse>>>,
    /// Prompts received, in order.
    pub received: Mutex<Vec<String>>,
    pub prompt_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    /// When set, `send_prompt` waits for a notification before answering.
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.prompts.lock().unwrap().push_back(Ok(PromptResponse {
            response: text.to_string(),
            processing_time: Some(serde_json::json!("0.42")),
        }));
        self
    }

    pub fn fail(self, status: u16, message: Option<&str>) -> Self {
        self.prompts.lock().unwrap().push_back(Err(ApiError::Api {
            status,
            message: message.map(str::to_string),
        }));
        self
    }

    pub fn status(self, status: StatusResponse) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(status));
        self
    }

    pub fn status_fail(self, status: u16) -> Self {
        self.statuses.lock().unwrap().push_back(Err(ApiError::Api {
            status,
            message: None,
        }));
        self
    }

    pub fn prompt_calls(&self) -> usize {
        self.prompt_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send_prompt(&self, prompt: &str) -> Result<PromptResponse> {
        self.prompt_calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.prompts.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Ok(PromptResponse {
                response: format!("echo: {prompt}"),
                processing_time: None,
            })
        })
    }

    async fn fetch_status(&self) -> Result<StatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(StatusResponse::default()))
    }
}

/// Status payload used throughout the tests.
pub fn mixed_status() -> StatusResponse {
    StatusResponse {
        crypto_connected: true,
        binance_connected: false,
        openai_connected: true,
        crypto_tools_count: 5,
        binance_tools_count: 0,
        llm_model: Some("gpt-4o".to_string()),
    }
}

pub fn widget_with(backend: Arc<ScriptedBackend>) -> Arc<ChatWidget<TranscriptView>> {
    Arc::new(ChatWidget::new(
        TranscriptView::new(),
        backend,
        Arc::new(CmarkRenderer::new()),
    ))
}
