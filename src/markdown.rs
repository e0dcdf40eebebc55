//! Markdown to HTML conversion for assistant and system messages.

use pulldown_cmark::{Event, Options, Parser, html};

/// Converts markdown into an HTML fragment.
pub trait MarkdownRenderer: Send + Sync + std::fmt::Debug {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer backed by `pulldown-cmark`.
///
/// Raw HTML blocks and inline HTML in the source are emitted as escaped
/// text, so a reply cannot inject markup into the page.
#[derive(Debug, Clone, Copy)]
pub struct CmarkRenderer {
    options: Options,
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CmarkRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Escape text for use in HTML body or double/single-quoted attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}
