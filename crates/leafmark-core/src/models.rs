//! Data models for leafmark
//!
//! Defines the two persisted records: `RecentFileItem` (key-value store)
//! and `Bookmark` (SQLite). Timestamps are milliseconds since the Unix epoch.

use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when the access layer cannot name a document
pub const UNKNOWN_FILE_NAME: &str = "Unknown File";

/// Current wall-clock time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a millisecond timestamp as local `yyyy-MM-dd HH:mm`
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => String::from("-"),
    }
}

/// A previously opened document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentFileItem {
    /// Opaque document reference (content URI, file URI or path)
    pub reference: String,
    /// Name shown in the library list
    pub display_name: String,
    /// When the document was last opened
    pub last_accessed: i64,
}

impl RecentFileItem {
    pub fn new(
        reference: impl Into<String>,
        display_name: impl Into<String>,
        last_accessed: i64,
    ) -> Self {
        Self {
            reference: reference.into(),
            display_name: display_name.into(),
            last_accessed,
        }
    }
}

/// A per-page annotation attached to a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bookmark {
    /// Row id; `0` asks the store to assign one
    pub id: i64,
    /// Reference of the document the bookmark belongs to
    pub pdf_uri: String,
    /// Zero-based page index
    pub page_index: u32,
    pub title: String,
    /// Free text, may be empty
    pub summary: String,
    /// When the bookmark was created
    pub creation_date: i64,
}

impl Bookmark {
    /// Create an unsaved bookmark stamped with the current time
    pub fn new(
        pdf_uri: impl Into<String>,
        page_index: u32,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            pdf_uri: pdf_uri.into(),
            page_index,
            title: title.into(),
            summary: summary.into(),
            creation_date: now_millis(),
        }
    }

    /// Override the creation timestamp
    pub fn created_at(mut self, creation_date: i64) -> Self {
        self.creation_date = creation_date;
        self
    }

    /// One-based page number for display
    pub fn page_number(&self) -> u32 {
        self.page_index + 1
    }

    /// Label shown in bookmark lists: `Title (yyyy-MM-dd HH:mm)`
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.title, format_timestamp(self.creation_date))
    }

    /// Whether the bookmark matches a lower-cased search needle
    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.summary.to_lowercase().contains(needle)
    }
}

/// Filter bookmarks by a free-text query over title and summary
///
/// The query is trimmed and compared case-insensitively. An empty query
/// keeps every bookmark. Input order is preserved.
pub fn filter_bookmarks(bookmarks: &[Bookmark], query: &str) -> Vec<Bookmark> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return bookmarks.to_vec();
    }

    bookmarks
        .iter()
        .filter(|b| b.matches(&needle))
        .cloned()
        .collect()
}
