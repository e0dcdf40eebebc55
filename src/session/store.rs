//! Widget sessions and their store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::ChatBackend;
use crate::markdown::MarkdownRenderer;
use crate::widget::{ChatWidget, StatusPoller, SubmitOutcome, Submission, TranscriptView};

/// The widget type served to browsers.
pub type PageWidget = ChatWidget<TranscriptView>;

/// One page load's widget together with its status poller.
#[derive(Debug)]
pub struct WidgetSession {
    inner: Arc<WidgetSessionInner>,
}

#[derive(Debug)]
struct PendingReply {
    seq: u64,
    handle: JoinHandle<SubmitOutcome>,
}

#[derive(Debug)]
struct WidgetSessionInner {
    id: String,
    widget: Arc<PageWidget>,
    poller: Mutex<Option<StatusPoller>>,
    /// Backend call of the submission whose reply the page has not fetched yet.
    reply: Mutex<Option<PendingReply>>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Clone for WidgetSession {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl WidgetSession {
    fn new(id: String, widget: Arc<PageWidget>, poller: Option<StatusPoller>) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(WidgetSessionInner {
                id,
                widget,
                poller: Mutex::new(poller),
                reply: Mutex::new(None),
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn widget(&self) -> &Arc<PageWidget> {
        &self.inner.widget
    }

    /// Whether the status poller is still running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|p| !p.is_cancelled())
    }

    /// Run a started submission's backend call in the background.
    ///
    /// The outcome is kept until [`take_reply`](Self::take_reply) claims it
    /// with the submission's sequence number.
    pub fn spawn_reply(&self, submission: Submission) -> u64 {
        let seq = submission.seq();
        let handle = tokio::spawn(submission.complete());
        let previous = self
            .inner
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(PendingReply { seq, handle });
        // The previous submission has settled; its outcome is already in the view.
        drop(previous);
        seq
    }

    /// Claim the background call for submission `seq`, if it is the pending one.
    pub fn take_reply(&self, seq: u64) -> Option<JoinHandle<SubmitOutcome>> {
        let mut slot = self
            .inner
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|p| p.seq == seq) {
            slot.take().map(|p| p.handle)
        } else {
            None
        }
    }

    /// Stop the status poller and abort any unclaimed backend call. Idempotent.
    pub fn shutdown(&self) {
        let poller = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(poller) = poller {
            poller.cancel();
            debug!(name: "widget.session.stopped", session_id = %self.inner.id, "Widget poller stopped");
        }

        let reply = self
            .inner
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reply) = reply {
            reply.handle.abort();
        }
    }

    fn last_activity(&self) -> DateTime<Utc> {
        *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    /// Check if the session has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // Negative durations (clock skew) count as fresh.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    /// Get the session age.
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.inner.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }
}

/// Thread-safe store of live widgets, one per page load.
#[derive(Debug, Clone)]
pub struct WidgetStore {
    inner: Arc<WidgetStoreInner>,
}

#[derive(Debug)]
struct WidgetStoreInner {
    sessions: RwLock<HashMap<String, WidgetSession>>,
    backend: Arc<dyn ChatBackend>,
    markdown: Arc<dyn MarkdownRenderer>,
    /// `None` disables background polling.
    poll_interval: Option<Duration>,
    max_sessions: usize,
}

impl WidgetStore {
    /// Create a store whose widgets poll status every `poll_interval`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        markdown: Arc<dyn MarkdownRenderer>,
        poll_interval: Option<Duration>,
    ) -> Self {
        Self::with_max_sessions(backend, markdown, poll_interval, usize::MAX)
    }

    /// Like [`new`](Self::new), holding at most `max_sessions` widgets.
    ///
    /// Creating one past the limit evicts the least recently active widget
    /// that has no submission in flight.
    #[must_use]
    pub fn with_max_sessions(
        backend: Arc<dyn ChatBackend>,
        markdown: Arc<dyn MarkdownRenderer>,
        poll_interval: Option<Duration>,
        max_sessions: usize,
    ) -> Self {
        Self {
            inner: Arc::new(WidgetStoreInner {
                sessions: RwLock::new(HashMap::new()),
                backend,
                markdown,
                poll_interval,
                max_sessions: max_sessions.max(1),
            }),
        }
    }

    /// Create a widget and start its poller.
    ///
    /// Must be called from within a tokio runtime when polling is enabled.
    #[must_use]
    pub fn create(&self) -> WidgetSession {
        let id = Uuid::new_v4().to_string();
        let widget = Arc::new(ChatWidget::new(
            TranscriptView::new(),
            Arc::clone(&self.inner.backend),
            Arc::clone(&self.inner.markdown),
        ));
        let poller = self
            .inner
            .poll_interval
            .map(|period| StatusPoller::spawn(Arc::clone(&widget), period));

        let session = WidgetSession::new(id.clone(), widget, poller);
        let evicted = {
            let mut sessions = self.write();
            let evicted = if sessions.len() >= self.inner.max_sessions {
                Self::evict_oldest(&mut sessions)
            } else {
                None
            };
            sessions.insert(id, session.clone());
            evicted
        };

        if let Some(old) = evicted {
            old.shutdown();
            info!(
                name: "widget.session.evicted",
                session_id = %old.id(),
                reason = "capacity",
                "Widget evicted to make room"
            );
        }

        info!(name: "widget.session.created", session_id = %session.id(), "Widget created");
        session
    }

    /// Get a session by ID, marking it active.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<WidgetSession> {
        let session = self.read().get(id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Remove a session and stop its poller.
    pub fn remove(&self, id: &str) -> Option<WidgetSession> {
        let session = self.write().remove(id)?;
        session.shutdown();
        info!(
            name: "widget.session.removed",
            session_id = %id,
            age_secs = session.age().as_secs(),
            "Widget removed"
        );
        Some(session)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Remove sessions idle longer than `timeout`, skipping any with a
    /// submission in flight. Returns the number removed.
    pub fn cleanup_idle(&self, timeout: Duration) -> usize {
        let mut guard = self.write();
        let expired: Vec<String> = guard
            .iter()
            .filter(|(_, s)| s.is_expired_with_timeout(timeout) && !s.widget().is_pending())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(session) = guard.remove(id) {
                session.shutdown();
            }
        }

        if !expired.is_empty() {
            info!(
                name: "widget.session.evicted",
                count = expired.len(),
                reason = "idle",
                "Idle widgets evicted"
            );
        }
        expired.len()
    }

    fn evict_oldest(sessions: &mut HashMap<String, WidgetSession>) -> Option<WidgetSession> {
        let id = sessions
            .values()
            .filter(|s| !s.widget().is_pending())
            .min_by_key(|s| s.last_activity())
            .map(|s| s.id().to_string())?;
        sessions.remove(&id)
    }

    /// Stop every poller and drop all sessions.
    pub fn shutdown(&self) {
        let drained: Vec<WidgetSession> = self.write().drain().map(|(_, s)| s).collect();
        for session in &drained {
            session.shutdown();
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, WidgetSession>> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, WidgetSession>> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
