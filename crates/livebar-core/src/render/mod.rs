//! Render - sidebar / wiki の描画
//!
//! Pure functions from a ranked stream list to document text. Nothing here
//! touches the network.

pub mod sidebar;
pub mod wiki;

use chrono::{DateTime, Utc};

pub use self::sidebar::{
    DEFAULT_TEMPLATE, END_MARKER, START_MARKER, SidebarFit, fit_sidebar, render_region,
    render_template, splice,
};
pub use self::wiki::{WIKI_EDIT_REASON, WikiContext, render_wiki, sanitize_cell};

/// Timestamp layout shared by the wiki page and the persisted records.
pub const TIMESTAMP_FORMAT: &str = "%b %d %Y at %I:%M %p UTC";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
