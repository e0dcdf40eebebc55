//! Rendering target for the widget.
//!
//! The widget only ever talks to a [`ChatView`]; [`TranscriptView`] is the
//! in-memory view model that the `ui` module turns into HTML.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::widget::message::Message;
use crate::widget::status::Service;

/// Everything the widget is allowed to do to the page.
///
/// The transcript region (messages, placeholders, scroll) and the status
/// region (indicators, tool counts, model) are disjoint.
pub trait ChatView: Send {
    /// Append a message at the end of the transcript.
    fn append_message(&mut self, message: Message);
    /// Append a loading placeholder with the given id.
    fn insert_placeholder(&mut self, id: &str);
    /// Remove a placeholder; returns `false` if it was not present.
    fn remove_placeholder(&mut self, id: &str) -> bool;
    fn set_input_value(&mut self, value: &str);
    fn set_input_enabled(&mut self, enabled: bool);
    fn focus_input(&mut self);
    fn scroll_to_bottom(&mut self);
    fn set_indicator(&mut self, service: Service, connected: bool);
    fn set_tool_count(&mut self, service: Service, count: u32);
    fn set_model_label(&mut self, model: Option<&str>);
}

/// One item of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Message(Message),
    Loading { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    seq: u64,
    entry: Entry,
}

/// State of the prompt input control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputState {
    pub value: String,
    pub disabled: bool,
    pub focused: bool,
}

/// Ordered in-memory view model.
///
/// Messages are only ever appended; the only entries that get removed are
/// loading placeholders.
#[derive(Debug, Default)]
pub struct TranscriptView {
    slots: Vec<Slot>,
    next_seq: u64,
    scroll_anchor: Option<u64>,
    input: InputState,
    indicators: BTreeMap<Service, bool>,
    tool_counts: BTreeMap<Service, u32>,
    model: Option<String>,
}

impl TranscriptView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, entry: Entry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.push(Slot { seq, entry });
    }

    /// All entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.slots.iter().map(|s| &s.entry)
    }

    /// Messages only, in display order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries().filter_map(|e| match e {
            Entry::Message(m) => Some(m),
            Entry::Loading { .. } => None,
        })
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages().count()
    }

    /// Ids of the placeholders currently shown.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        self.entries()
            .filter_map(|e| match e {
                Entry::Loading { id } => Some(id.as_str()),
                Entry::Message(_) => None,
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// `None` until the first successful status poll.
    #[must_use]
    pub fn indicator(&self, service: Service) -> Option<bool> {
        self.indicators.get(&service).copied()
    }

    #[must_use]
    pub fn indicators(&self) -> &BTreeMap<Service, bool> {
        &self.indicators
    }

    #[must_use]
    pub fn tool_count(&self, service: Service) -> Option<u32> {
        self.tool_counts.get(&service).copied()
    }

    #[must_use]
    pub fn tool_counts(&self) -> &BTreeMap<Service, u32> {
        &self.tool_counts
    }

    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Whether the newest entry was scrolled into view.
    #[must_use]
    pub fn is_scrolled_to_latest(&self) -> bool {
        match self.slots.last() {
            Some(last) => self.scroll_anchor == Some(last.seq),
            None => true,
        }
    }
}

impl ChatView for TranscriptView {
    fn append_message(&mut self, message: Message) {
        self.push(Entry::Message(message));
    }

    fn insert_placeholder(&mut self, id: &str) {
        self.push(Entry::Loading { id: id.to_string() });
    }

    fn remove_placeholder(&mut self, id: &str) -> bool {
        let before = self.slots.len();
        self.slots
            .retain(|s| !matches!(&s.entry, Entry::Loading { id: existing } if existing == id));
        self.slots.len() != before
    }

    fn set_input_value(&mut self, value: &str) {
        self.input.value = value.to_string();
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input.disabled = !enabled;
        // A disabled control cannot hold focus.
        if !enabled {
            self.input.focused = false;
        }
    }

    fn focus_input(&mut self) {
        if !self.input.disabled {
            self.input.focused = true;
        }
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_anchor = self.slots.last().map(|s| s.seq);
    }

    fn set_indicator(&mut self, service: Service, connected: bool) {
        self.indicators.insert(service, connected);
    }

    fn set_tool_count(&mut self, service: Service, count: u32) {
        self.tool_counts.insert(service, count);
    }

    fn set_model_label(&mut self, model: Option<&str>) {
        self.model = model.map(str::to_string);
    }
}
