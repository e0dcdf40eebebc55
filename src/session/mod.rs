//! Per-page widget sessions.
//!
//! Every page load gets its own [`WidgetSession`]: a fresh widget with an
//! empty transcript and its own status poller. Sessions are identified by
//! UUID and evicted after a period of inactivity, which also stops their
//! pollers.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use agent_chat_widget::api::HttpBackend;
//! use agent_chat_widget::markdown::CmarkRenderer;
//! use agent_chat_widget::session::WidgetStore;
//!
//! let backend = Arc::new(HttpBackend::new("http://127.0.0.1:8000", None).unwrap());
//! let store = WidgetStore::new(backend, Arc::new(CmarkRenderer::new()), None);
//! let session = store.create();
//!
//! session.widget().set_suggestion("What is BTC at?");
//! assert_eq!(store.len(), 1);
//! ```

mod store;

pub use store::{PageWidget, WidgetSession, WidgetStore};
