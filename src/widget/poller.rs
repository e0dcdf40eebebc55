//! Periodic status polling as a cancellable task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::widget::ChatWidget;
use crate::widget::view::ChatView;

/// Handle to a running status poll loop.
///
/// The first poll runs immediately, then one per period. A failed poll is
/// logged and the next tick retries. Dropping the handle cancels the loop.
#[derive(Debug)]
pub struct StatusPoller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Spawn the poll loop on the current tokio runtime.
    pub fn spawn<V>(widget: Arc<ChatWidget<V>>, period: Duration) -> Self
    where
        V: ChatView + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    () = cancelled.cancelled() => break,
                    result = widget.poll_status() => {
                        if let Err(e) = result {
                            warn!(name: "widget.status.failed", error = %e, "Status poll failed");
                        }
                    }
                }
            }

            debug!(name: "widget.status.stopped", "Status poller stopped");
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Request cancellation without waiting for the loop to exit.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the loop to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
