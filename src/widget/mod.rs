//! The chat widget: prompt submission, transcript rendering, status display.
//!
//! # Architecture
//!
//! - [`ChatWidget`]: the component; owns its view and the single-flight flag
//! - [`view`]: the [`ChatView`] rendering target and the [`TranscriptView`] model
//! - [`message`]: transcript messages
//! - [`status`]: connectivity snapshots
//! - [`poller`]: the cancellable periodic status poll
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_chat_widget::api::HttpBackend;
//! use agent_chat_widget::markdown::CmarkRenderer;
//! use agent_chat_widget::widget::{ChatWidget, TranscriptView};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpBackend::new("http://127.0.0.1:8000", None)?);
//! let widget = ChatWidget::new(TranscriptView::new(), backend, Arc::new(CmarkRenderer::new()));
//!
//! let outcome = widget.submit("What is BTC trading at?").await?;
//! println!("{}", outcome.reply.html);
//! # Ok(())
//! # }
//! ```

pub mod message;
pub mod poller;
pub mod status;
pub mod view;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use crate::api::{ChatBackend, PromptResponse};
use crate::error::{ApiError, SubmitError};
use crate::markdown::{MarkdownRenderer, escape_html};

pub use message::{Message, Role};
pub use poller::StatusPoller;
pub use status::{ConnectivityStatus, Service, ServiceStatus};
pub use view::{ChatView, Entry, InputState, TranscriptView};

/// Messages produced by one completed submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// The optimistic user message.
    pub user: Message,
    /// Assistant reply on success, system error message on failure.
    pub reply: Message,
}

impl SubmitOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.reply.role == Role::Assistant
    }
}

/// Chat widget bound to an injected rendering target.
///
/// At most one submission is in flight at a time. The view mutex is never
/// held across a backend call, so the status poll can update the page while
/// a prompt is pending.
pub struct ChatWidget<V: ChatView = TranscriptView> {
    backend: Arc<dyn ChatBackend>,
    markdown: Arc<dyn MarkdownRenderer>,
    view: Mutex<V>,
    pending: AtomicBool,
    placeholder_seq: AtomicU64,
}

impl<V: ChatView> fmt::Debug for ChatWidget<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatWidget")
            .field("backend", &self.backend)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

impl<V: ChatView> ChatWidget<V> {
    pub fn new(
        view: V,
        backend: Arc<dyn ChatBackend>,
        markdown: Arc<dyn MarkdownRenderer>,
    ) -> Self {
        Self {
            backend,
            markdown,
            view: Mutex::new(view),
            pending: AtomicBool::new(false),
            placeholder_seq: AtomicU64::new(0),
        }
    }

    /// Read the current view.
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&*self.lock_view())
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    fn lock_view(&self) -> MutexGuard<'_, V> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a prompt and render the exchange.
    ///
    /// The user message, cleared and disabled input, and loading placeholder
    /// are applied before the request goes out. Whatever the outcome, the
    /// placeholder is removed and the input re-enabled and focused, including
    /// when this future is dropped before the backend answers.
    pub async fn submit(&self, prompt: &str) -> Result<SubmitOutcome, SubmitError> {
        let started = self.start(prompt)?;
        let in_flight = InFlight {
            widget: self,
            placeholder: started.placeholder.as_str(),
        };

        let result = self.backend.send_prompt(&started.prompt).await;
        let reply = self.finish(in_flight.placeholder, result);

        drop(in_flight);
        Ok(SubmitOutcome {
            user: started.user,
            reply,
        })
    }

    /// Apply the optimistic part of a submission and hand back the rest.
    ///
    /// Returns as soon as the user message, cleared and disabled input and
    /// loading placeholder are in the view. The backend call happens in
    /// [`Submission::complete`]; dropping the [`Submission`] instead restores
    /// the idle state.
    pub fn begin_submit(self: &Arc<Self>, prompt: &str) -> Result<Submission<V>, SubmitError> {
        let started = self.start(prompt)?;
        Ok(Submission {
            widget: Arc::clone(self),
            started,
        })
    }

    fn start(&self, prompt: &str) -> Result<Started, SubmitError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SubmitError::EmptyPrompt);
        }

        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(name: "widget.submit.rejected", "Submission already in flight");
            return Err(SubmitError::Busy);
        }

        let seq = self.placeholder_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let placeholder = placeholder_id(seq);

        let user = {
            let mut view = self.lock_view();
            let user = self.render_into(&mut *view, Role::User, prompt);
            view.set_input_value("");
            view.set_input_enabled(false);
            view.insert_placeholder(&placeholder);
            view.scroll_to_bottom();
            user
        };

        info!(
            name: "widget.submit.sent",
            placeholder = %placeholder,
            prompt_length = prompt.len(),
            "Prompt submitted"
        );
        debug!(prompt = %prompt, "Prompt content");

        Ok(Started {
            seq,
            placeholder,
            prompt: prompt.to_string(),
            user,
        })
    }

    fn finish(&self, placeholder: &str, result: Result<PromptResponse, ApiError>) -> Message {
        let mut view = self.lock_view();
        view.remove_placeholder(placeholder);
        match result {
            Ok(resp) => {
                info!(
                    name: "widget.submit.replied",
                    response_length = resp.response.len(),
                    processing_time = ?resp.processing_time,
                    "Backend replied"
                );
                self.render_into(&mut *view, Role::Assistant, &resp.response)
            }
            Err(e) => {
                error!(name: "widget.submit.failed", error = %e, "Prompt request failed");
                let text = format!("Error: {}", e.display_text());
                self.render_into(&mut *view, Role::System, &text)
            }
        }
    }

    /// Back to idle: no placeholder, input enabled and focused.
    fn settle(&self, placeholder: &str) {
        let mut view = self.lock_view();
        view.remove_placeholder(placeholder);
        view.set_input_enabled(true);
        view.focus_input();
        drop(view);
        self.pending.store(false, Ordering::Release);
    }

    /// Fetch the backend status once and update the status region.
    ///
    /// On failure the view is left untouched and the error is returned for
    /// the caller to log; it is never shown in the transcript.
    pub async fn poll_status(&self) -> Result<ConnectivityStatus, ApiError> {
        let status = ConnectivityStatus::from(self.backend.fetch_status().await?);

        let mut view = self.lock_view();
        for (service, state) in &status.services {
            view.set_indicator(*service, state.connected);
            if let Some(count) = state.tool_count {
                view.set_tool_count(*service, count);
            }
        }
        view.set_model_label(status.model.as_deref());
        drop(view);

        debug!(name: "widget.status.updated", status = ?status, "Status snapshot applied");
        Ok(status)
    }

    /// Append a message to the transcript and scroll to it.
    pub fn render_message(&self, role: Role, content: &str) -> Message {
        let mut view = self.lock_view();
        self.render_into(&mut *view, role, content)
    }

    /// Put suggestion text into the input control and focus it.
    pub fn set_suggestion(&self, text: &str) {
        let mut view = self.lock_view();
        view.set_input_value(text);
        view.focus_input();
    }

    fn render_into(&self, view: &mut V, role: Role, content: &str) -> Message {
        let html = if role.renders_markdown() {
            self.markdown.render(content)
        } else {
            escape_html(content)
        };
        let message = Message::now(role, content, html);
        view.append_message(message.clone());
        view.scroll_to_bottom();
        message
    }
}

/// Element id of the loading placeholder for submission `seq`.
#[must_use]
pub fn placeholder_id(seq: u64) -> String {
    format!("loading-{seq}")
}

/// Optimistic state already applied to the view.
#[derive(Debug)]
struct Started {
    seq: u64,
    placeholder: String,
    prompt: String,
    user: Message,
}

/// Restores the idle state when a borrowed submission ends, however it ends.
struct InFlight<'a, V: ChatView> {
    widget: &'a ChatWidget<V>,
    placeholder: &'a str,
}

impl<V: ChatView> Drop for InFlight<'_, V> {
    fn drop(&mut self) {
        self.widget.settle(self.placeholder);
    }
}

/// A submission whose optimistic state is on the page and whose backend call
/// has not run yet.
///
/// Owns the widget, so it can be moved into a spawned task. The idle state is
/// restored when it is dropped, whether or not [`complete`](Self::complete)
/// ran to the end.
pub struct Submission<V: ChatView = TranscriptView> {
    widget: Arc<ChatWidget<V>>,
    started: Started,
}

impl<V: ChatView> fmt::Debug for Submission<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("seq", &self.started.seq)
            .field("placeholder", &self.started.placeholder)
            .finish_non_exhaustive()
    }
}

impl<V: ChatView> Submission<V> {
    /// Sequence number; the placeholder id is `loading-{seq}`.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.started.seq
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.started.placeholder
    }

    /// The optimistic user message.
    #[must_use]
    pub fn user(&self) -> &Message {
        &self.started.user
    }

    /// Call the backend and render the reply or the error.
    pub async fn complete(self) -> SubmitOutcome {
        let result = self.widget.backend.send_prompt(&self.started.prompt).await;
        let reply = self.widget.finish(&self.started.placeholder, result);
        SubmitOutcome {
            user: self.started.user.clone(),
            reply,
        }
    }
}

impl<V: ChatView> Drop for Submission<V> {
    fn drop(&mut self) {
        self.widget.settle(&self.started.placeholder);
    }
}
