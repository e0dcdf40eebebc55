//! Chat messages as they appear in the transcript.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text the user typed.
    User,
    /// Reply from the agent backend.
    Assistant,
    /// Widget-generated notice, e.g. a failed request.
    System,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Whether content of this role goes through markdown rendering.
    #[must_use]
    pub fn renders_markdown(self) -> bool {
        !matches!(self, Self::User)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry.
///
/// `html` is the body exactly as inserted into the page: escaped text for
/// user messages, rendered markdown otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub html: String,
    /// Local wall-clock label, e.g. `3:04:05 PM`.
    pub timestamp: String,
}

impl Message {
    /// Stamp a message with the current local time.
    #[must_use]
    pub fn now(role: Role, content: impl Into<String>, html: impl Into<String>) -> Self {
        Self::at(role, content, html, Local::now())
    }

    #[must_use]
    pub fn at(
        role: Role,
        content: impl Into<String>,
        html: impl Into<String>,
        when: DateTime<Local>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            html: html.into(),
            timestamp: format_time(when),
        }
    }
}

/// Format a time the way browsers render `toLocaleTimeString()` for en-US.
#[must_use]
pub fn format_time(when: DateTime<Local>) -> String {
    when.format("%-I:%M:%S %p").to_string()
}
