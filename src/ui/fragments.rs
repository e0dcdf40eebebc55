//! HTML fragments for the pieces of the widget htmx swaps independently.

use std::fmt::Write as _;

use crate::markdown::escape_html;
use crate::widget::{Entry, InputState, Message, Service, TranscriptView};

/// One transcript message.
#[must_use]
pub fn message_html(message: &Message) -> String {
    format!(
        r#"<div class="{role}-message">
    <div class="message-content">{body}</div>
    <div class="message-time">{time}</div>
</div>
"#,
        role = message.role.as_str(),
        body = message.html,
        time = escape_html(&message.timestamp),
    )
}

/// A transcript entry: a message or a loading placeholder.
#[must_use]
pub fn entry_html(entry: &Entry) -> String {
    match entry {
        Entry::Message(message) => message_html(message),
        Entry::Loading { id } => placeholder_html(id, None),
    }
}

/// Loading placeholder for an in-flight submission.
///
/// With a `reply_url` the placeholder fetches the reply as soon as it is
/// swapped in and replaces itself with it.
#[must_use]
pub fn placeholder_html(id: &str, reply_url: Option<&str>) -> String {
    let fetch = reply_url.map_or_else(String::new, |url| {
        format!(
            r#" hx-get="{url}" hx-trigger="load" hx-swap="outerHTML scroll:#chat-history:bottom""#,
            url = escape_html(url),
        )
    });
    format!(
        r#"<div class="loading-indicator" id="{id}"{fetch}><div class="spinner"></div></div>
"#,
        id = escape_html(id),
    )
}

/// Every entry of the transcript, in order.
#[must_use]
pub fn transcript_html(view: &TranscriptView) -> String {
    view.entries().map(entry_html).collect()
}

/// The prompt input control.
///
/// With `out_of_band` set the element carries `hx-swap-oob` so it can ride
/// along with a transcript fragment.
#[must_use]
pub fn input_html(input: &InputState, out_of_band: bool) -> String {
    let mut attrs = String::new();
    if input.disabled {
        attrs.push_str(" disabled");
    }
    if input.focused {
        attrs.push_str(" autofocus");
    }
    if out_of_band {
        attrs.push_str(r#" hx-swap-oob="true""#);
    }

    format!(
        r#"<input id="prompt-input" name="prompt" type="text" autocomplete="off" placeholder="Ask about markets, positions or orders..." value="{value}"{attrs}>"#,
        value = escape_html(&input.value),
    )
}

fn indicator_html(service: Service, connected: Option<bool>) -> String {
    let (class, text) = match connected {
        Some(true) => ("connected", "Connected"),
        Some(false) => ("disconnected", "Disconnected"),
        None => ("checking", "Checking..."),
    };
    format!(
        r#"<div id="{id}" class="status-row"><span class="status-label">{label}</span><span class="status-indicator {class}">{text}</span></div>"#,
        id = service.status_id(),
        label = service.label(),
    )
}

fn tool_count_html(service: Service, count: Option<u32>) -> String {
    let count = count.map_or_else(|| "-".to_string(), |c| c.to_string());
    format!(
        r#"<div id="{id}" class="tools-row"><span class="tools-label">{label} tools</span><span class="tools-count">{count}</span></div>"#,
        id = service.tools_id(),
        label = service.label(),
    )
}

/// The status panel. It fetches its rows from `refresh_url` shortly after
/// the page loads and then every `refresh_secs` seconds.
#[must_use]
pub fn status_panel_html(view: &TranscriptView, refresh_url: &str, refresh_secs: u64) -> String {
    format!(
        r#"<aside id="status-panel" class="status-panel" hx-get="{url}" hx-trigger="load delay:500ms, every {refresh_secs}s" hx-swap="innerHTML">
{rows}</aside>
"#,
        url = escape_html(refresh_url),
        rows = status_rows_html(view, refresh_url),
    )
}

/// Contents of the status panel.
///
/// Until the first snapshot arrives the rows carry a hidden element that
/// asks again a second later.
#[must_use]
pub fn status_rows_html(view: &TranscriptView, refresh_url: &str) -> String {
    let mut out = String::from("    <h2>Status</h2>\n");

    for service in Service::ALL {
        let _ = writeln!(out, "    {}", indicator_html(service, view.indicator(service)));
    }
    for service in [Service::Crypto, Service::Binance] {
        let _ = writeln!(out, "    {}", tool_count_html(service, view.tool_count(service)));
    }
    if let Some(model) = view.model() {
        let _ = writeln!(
            out,
            r#"    <div class="model-row">Model: <span class="model-name">{}</span></div>"#,
            escape_html(model)
        );
    }
    if view.indicators().is_empty() {
        let _ = writeln!(
            out,
            r##"    <span class="status-retry" hidden hx-get="{}" hx-trigger="load delay:1s" hx-target="#status-panel" hx-swap="innerHTML"></span>"##,
            escape_html(refresh_url)
        );
    }
    out
}

/// Buttons that fill the input with a canned prompt.
#[must_use]
pub fn suggestions_html(suggestions: &[String], suggestion_url: &str) -> String {
    let mut out = String::from("<div class=\"suggestions\">\n");
    for text in suggestions {
        let vals = serde_json::json!({ "text": text }).to_string();
        let _ = writeln!(
            out,
            r##"    <button type="button" class="suggestion" hx-get="{url}" hx-vals="{vals}" hx-target="#prompt-input" hx-swap="outerHTML">{label}</button>"##,
            url = escape_html(suggestion_url),
            vals = escape_html(&vals),
            label = escape_html(text),
        );
    }
    out.push_str("</div>\n");
    out
}
