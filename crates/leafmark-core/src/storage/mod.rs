//! Storage layer
//!
//! - **SQLite**: bookmarks, with live per-document queries
//! - **Preferences**: key-value string sets (recent files, access grants)
//!   kept in JSON files written atomically

pub mod bookmarks;
pub mod error;
pub mod prefs;
pub mod schema;

pub use bookmarks::{BookmarkStore, BookmarkSubscription};
pub use error::{StorageError, StorageResult};
pub use prefs::{FilePreferences, MemoryPreferences, Preferences};
pub use schema::{init_schema, migrate, needs_init, SCHEMA_VERSION};
