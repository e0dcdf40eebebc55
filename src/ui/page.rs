//! Full-page rendering.

use std::path::Path;

use crate::markdown::escape_html;
use crate::ui::fragments::{input_html, status_panel_html, suggestions_html, transcript_html};
use crate::widget::TranscriptView;

/// Per-page values the chat page needs besides the view.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Id of the widget this page is bound to.
    pub widget_id: &'a str,
    /// Status refresh period in seconds.
    pub poll_interval_secs: u64,
    /// Canned prompts shown under the input.
    pub suggestions: &'a [String],
    /// Where the page loads htmx from, see [`htmx_src`].
    pub htmx_src: &'a str,
}

impl PageContext<'_> {
    #[must_use]
    pub fn route(&self, action: &str) -> String {
        format!("/widget/{}/{action}", self.widget_id)
    }
}

/// htmx, relative to the static directory.
pub const HTMX_VENDOR_PATH: &str = "vendor/htmx-2.0.8.min.js";

/// Used when no vendored copy is present.
pub const HTMX_CDN_URL: &str = "https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js";

/// Script URL for htmx: the vendored copy under `static_dir` when it
/// exists, the CDN otherwise.
pub async fn htmx_src(static_dir: &Path) -> String {
    let vendored = tokio::fs::metadata(static_dir.join(HTMX_VENDOR_PATH))
        .await
        .is_ok_and(|m| m.is_file());
    if vendored {
        format!("/static/{HTMX_VENDOR_PATH}")
    } else {
        HTMX_CDN_URL.to_string()
    }
}

/// Generate the HTML shell for the application.
#[must_use]
pub fn html_shell(title: &str, htmx_src: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Chat with the trading agent">
    <title>{title}</title>
    <script src="{htmx_src}"></script>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <main id="app" class="app">
{content}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        htmx_src = escape_html(htmx_src),
    )
}

/// Chat page content: status panel, transcript, suggestions and prompt form.
#[must_use]
pub fn chat_content(ctx: &PageContext<'_>, view: &TranscriptView) -> String {
    let status = status_panel_html(view, &ctx.route("status"), ctx.poll_interval_secs);
    let transcript = transcript_html(view);
    let suggestions = suggestions_html(ctx.suggestions, &ctx.route("suggestion"));
    let input = input_html(view.input(), false);
    let prompt_url = ctx.route("prompt");
    // JSON string literal doubles as a JS string literal.
    let close_url = serde_json::Value::from(format!("/widget/{}", ctx.widget_id)).to_string();

    format!(
        r##"<div class="chat-layout" data-widget-id="{widget_id}">
{status}
<section class="chat-shell">
    <div id="chat-history" class="chat-history" aria-live="polite">
{transcript}    </div>
{suggestions}
    <form id="prompt-form"
        hx-post="{prompt_url}"
        hx-target="#chat-history"
        hx-swap="beforeend scroll:bottom">
        {input}
        <button id="submit-button" type="submit">Send</button>
    </form>
</section>
</div>
<script>
    addEventListener("pagehide", () => fetch({close_url}, {{ method: "DELETE", keepalive: true }}));
</script>"##,
        widget_id = escape_html(ctx.widget_id),
    )
}

/// The complete chat page.
#[must_use]
pub fn chat_page(ctx: &PageContext<'_>, view: &TranscriptView) -> String {
    html_shell("Crypto Trading Agent", ctx.htmx_src, &chat_content(ctx, view))
}
