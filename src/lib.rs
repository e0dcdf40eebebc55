//! Agent Chat Widget
//!
//! An HTML-first chat widget for an MCP-backed crypto trading agent. The
//! widget posts prompts to the agent backend, renders the conversation with
//! markdown-formatted replies, and polls the backend's status endpoint to show
//! which services are connected and how many tools they expose.
//!
//! # Architecture
//!
//! - **Widget**: prompt submission, transcript and status state behind an injected view
//! - **Backend client**: reqwest client for `/api/prompt` and `/api/status`
//! - **UI**: `format!` HTML templates swapped into the page by htmx
//! - **Server**: Axum host serving one widget per page load
//!
//! # Modules
//!
//! - [`widget`]: the chat widget, its view model and the status poller
//! - [`api`]: backend trait, wire types and HTTP client
//! - [`markdown`]: markdown to HTML conversion
//! - [`session`]: per-page widget store
//! - [`ui`]: HTML rendering
//! - [`server`]: router and startup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod config;
pub mod error;
pub mod markdown;
pub mod server;
pub mod session;
pub mod ui;
pub mod widget;

use crate::config::AppConfig;

use session::WidgetStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live widgets, one per page load.
    pub widgets: WidgetStore,
    /// Application configuration.
    pub config: Arc<AppConfig>,
}
