//! HTML rendering of the widget's view model.
//!
//! Plain `format!` templates; htmx swaps the fragments into the page.
//!
//! - [`page`]: the HTML shell and chat page
//! - [`fragments`]: transcript entries, input control, status panel, suggestions

pub mod fragments;
pub mod page;

pub use fragments::{
    input_html, message_html, placeholder_html, status_panel_html, status_rows_html,
    transcript_html,
};
pub use page::{PageContext, chat_page};
