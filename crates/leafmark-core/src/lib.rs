//! leafmark Core Library
//!
//! This crate provides the core functionality for leafmark, a document
//! reader companion that remembers recently opened documents and keeps
//! per-page bookmarks.
//!
//! # Architecture
//!
//! - **SQLite**: bookmarks, with live per-document subscriptions
//! - **Preferences**: key-value string sets holding the recent-files list
//!   and durable access grants
//! - **Session controller**: drives the library / loading / loaded flow on
//!   top of a pluggable render surface and access layer
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Remember a document
//! store.touch_recent("/papers/attention.pdf", "attention.pdf")?;
//!
//! // Bookmark its third page
//! store.add_bookmark(&Bookmark::new("/papers/attention.pdf", 2, "Model", ""))?;
//!
//! // Query bookmarks, newest first
//! let bookmarks = store.get_bookmarks("/papers/attention.pdf")?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `session`: Reading session controller
//! - `models`: Recent-file entries and bookmarks
//! - `recent`: Recent-files list kept in preferences
//! - `access`: Durable document access
//! - `render`: Render surface collaborator
//! - `notification`: User-visible messages
//! - `storage`: SQLite and preferences persistence
//! - `config`: Application configuration

pub mod access;
pub mod config;
pub mod models;
pub mod notification;
pub mod recent;
pub mod render;
pub mod session;
pub mod storage;
pub mod store;

pub use access::{AccessError, DocumentAccess, FileSystemAccess};
pub use config::Config;
pub use models::{filter_bookmarks, Bookmark, RecentFileItem};
pub use notification::Notification;
pub use recent::RecentFiles;
pub use render::{RenderCallbacks, RenderEvent, RenderSurface};
pub use session::{SessionController, SessionState};
pub use storage::{
    BookmarkStore, BookmarkSubscription, FilePreferences, MemoryPreferences, Preferences,
    StorageError,
};
pub use store::Store;
