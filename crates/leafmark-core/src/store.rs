//! Unified storage interface
//!
//! The `Store` owns both persistent stores the reader needs:
//! - the SQLite bookmark database
//! - the recent-files list in the key-value preferences
//!
//! It is constructed once at startup and handed to whoever needs it; there
//! is no global handle.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! store.touch_recent("/papers/attention.pdf", "attention.pdf")?;
//! store.add_bookmark(&Bookmark::new("/papers/attention.pdf", 2, "Model", ""))?;
//!
//! let bookmarks = store.get_bookmarks("/papers/attention.pdf")?;
//! ```

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::{filter_bookmarks, Bookmark, RecentFileItem};
use crate::recent::RecentFiles;
use crate::storage::{BookmarkStore, BookmarkSubscription, FilePreferences, MemoryPreferences, Preferences};

/// Unified storage interface for leafmark
pub struct Store<P = FilePreferences> {
    /// Bookmark database
    bookmarks: BookmarkStore,
    /// Recent-files list
    recent: RecentFiles<P>,
    /// Configuration
    config: Config,
}

impl Store<FilePreferences> {
    /// Open the store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    pub fn open_with_config(config: Config) -> Result<Self> {
        let bookmarks =
            BookmarkStore::open(&config).context("Failed to open bookmark database")?;
        let prefs = FilePreferences::open(config.preferences_path())
            .context("Failed to open preferences")?;

        Ok(Self::from_parts(config, bookmarks, prefs))
    }
}

impl Store<MemoryPreferences> {
    /// Open a store that keeps everything in memory (for testing)
    pub fn in_memory() -> Result<Self> {
        let bookmarks =
            BookmarkStore::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self::from_parts(
            Config::default(),
            bookmarks,
            MemoryPreferences::new(),
        ))
    }
}

impl<P: Preferences> Store<P> {
    /// Assemble a store from already opened parts
    pub fn from_parts(config: Config, bookmarks: BookmarkStore, prefs: P) -> Self {
        Self {
            bookmarks,
            recent: RecentFiles::new(prefs),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Recent Files ====================

    /// Recently opened documents, most recent first
    pub fn recent_files(&self) -> Vec<RecentFileItem> {
        self.recent.load()
    }

    /// Record that a document was opened
    pub fn touch_recent(
        &mut self,
        reference: &str,
        display_name: &str,
    ) -> Result<Vec<RecentFileItem>> {
        self.recent
            .touch(reference, display_name)
            .context("Failed to save recent files")
    }

    /// Forget a recently opened document
    pub fn remove_recent(&mut self, reference: &str) -> Result<Vec<RecentFileItem>> {
        self.recent
            .remove(reference)
            .context("Failed to save recent files")
    }

    // ==================== Bookmarks ====================

    /// Save a bookmark, returning its id
    pub fn add_bookmark(&mut self, bookmark: &Bookmark) -> Result<i64> {
        self.bookmarks
            .insert(bookmark)
            .context("Failed to save bookmark")
    }

    /// Delete a bookmark by id
    pub fn delete_bookmark(&mut self, id: i64) -> Result<()> {
        self.bookmarks
            .delete(id)
            .context("Failed to delete bookmark")
    }

    /// Get a bookmark by id
    pub fn get_bookmark(&self, id: i64) -> Result<Option<Bookmark>> {
        self.bookmarks
            .get_bookmark(id)
            .context("Failed to get bookmark")
    }

    /// Bookmarks of a document, newest first
    pub fn get_bookmarks(&self, document: &str) -> Result<Vec<Bookmark>> {
        self.bookmarks
            .get_bookmarks(document)
            .context("Failed to get bookmarks")
    }

    /// Bookmarks of a document whose title or summary matches `query`
    pub fn search_bookmarks(&self, document: &str, query: &str) -> Result<Vec<Bookmark>> {
        let bookmarks = self.get_bookmarks(document)?;
        Ok(filter_bookmarks(&bookmarks, query))
    }

    /// Subscribe to a document's bookmarks
    pub fn bookmarks_for(&mut self, document: &str) -> Result<BookmarkSubscription> {
        self.bookmarks
            .bookmarks_for(document)
            .context("Failed to query bookmarks")
    }

    /// Total number of bookmarks
    pub fn bookmark_count(&self) -> Result<i64> {
        self.bookmarks
            .bookmark_count()
            .context("Failed to count bookmarks")
    }

    /// Get the bookmark database
    pub fn bookmark_store_mut(&mut self) -> &mut BookmarkStore {
        &mut self.bookmarks
    }
}
