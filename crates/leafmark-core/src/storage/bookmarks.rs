//! SQLite bookmark store
//!
//! Durable storage for per-page bookmarks with live per-document queries.
//!
//! ## Subscriptions
//!
//! `bookmarks_for` returns a `BookmarkSubscription` backed by a
//! `tokio::sync::watch` channel. The channel always holds the latest
//! snapshot for its document, newest first. Every insert or delete
//! re-runs the query for each subscribed document and publishes the result
//! when it differs from what the subscriber last saw, so rapid successive
//! writes collapse into the most recent snapshot.
//!
//! A subscription ends when its handle is cancelled or dropped; closed
//! subscribers are pruned on the next publish.

use std::path::Path;
use std::pin::Pin;

use futures_util::stream::{self, Stream};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::schema::migrate;
use crate::config::Config;
use crate::models::Bookmark;

const SELECT_COLUMNS: &str = "SELECT id, pdfUri, pageIndex, title, summary, creationDate FROM bookmarks";

/// A registered live query
struct Subscriber {
    document: String,
    tx: watch::Sender<Vec<Bookmark>>,
}

/// SQLite-backed bookmark storage
pub struct BookmarkStore {
    conn: Connection,
    subscribers: Vec<Subscriber>,
}

impl BookmarkStore {
    /// Open or create the bookmark database
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(&config.sqlite_path())
    }

    /// Open or create the bookmark database at a specific path
    pub fn open_path(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        migrate(&conn)?;
        debug!("Opened bookmark database at {:?}", path);

        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            subscribers: Vec::new(),
        }
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ==================== Live Queries ====================

    /// Subscribe to the bookmarks of a document, newest first
    ///
    /// The subscription starts out holding the current snapshot.
    pub fn bookmarks_for(&mut self, document: &str) -> StorageResult<BookmarkSubscription> {
        let snapshot = self.get_bookmarks(document)?;
        let (tx, rx) = watch::channel(snapshot);

        self.subscribers.push(Subscriber {
            document: document.to_string(),
            tx,
        });
        debug!(
            "Subscribed to bookmarks for {} ({} active)",
            document,
            self.subscribers.len()
        );

        Ok(BookmarkSubscription {
            document: document.to_string(),
            rx,
            primed: false,
        })
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&mut self) -> usize {
        self.subscribers.retain(|s| !s.tx.is_closed());
        self.subscribers.len()
    }

    /// Re-run every subscribed query and publish changed snapshots
    fn publish(&mut self) {
        self.subscribers.retain(|s| !s.tx.is_closed());

        for subscriber in &self.subscribers {
            let fresh = match query_document(&self.conn, &subscriber.document) {
                Ok(fresh) => fresh,
                Err(e) => {
                    // Subscribers keep the last successful snapshot
                    warn!(
                        "Failed to refresh bookmarks for {}: {}",
                        subscriber.document, e
                    );
                    continue;
                }
            };

            subscriber.tx.send_if_modified(|current| {
                if *current == fresh {
                    false
                } else {
                    *current = fresh;
                    true
                }
            });
        }
    }

    // ==================== Mutations ====================

    /// Insert a bookmark, replacing any row with the same id
    ///
    /// An id of `0` lets the database assign one. Returns the stored id.
    pub fn insert(&mut self, bookmark: &Bookmark) -> StorageResult<i64> {
        let id = (bookmark.id != 0).then_some(bookmark.id);

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO bookmarks (id, pdfUri, pageIndex, title, summary, creationDate)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                id,
                bookmark.pdf_uri,
                bookmark.page_index,
                bookmark.title,
                bookmark.summary,
                bookmark.creation_date,
            ],
        )?;

        let stored_id = id.unwrap_or_else(|| self.conn.last_insert_rowid());
        debug!(
            "Stored bookmark {} for {} on page {}",
            stored_id, bookmark.pdf_uri, bookmark.page_index
        );

        self.publish();
        Ok(stored_id)
    }

    /// Delete a bookmark by id; deleting an unknown id is a no-op
    pub fn delete(&mut self, id: i64) -> StorageResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?", params![id])?;

        if removed > 0 {
            debug!("Deleted bookmark {}", id);
            self.publish();
        }
        Ok(())
    }

    // ==================== Query Methods ====================

    /// Snapshot of a document's bookmarks, newest first
    pub fn get_bookmarks(&self, document: &str) -> StorageResult<Vec<Bookmark>> {
        query_document(&self.conn, document)
    }

    /// Get a bookmark by id
    pub fn get_bookmark(&self, id: i64) -> StorageResult<Option<Bookmark>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let bookmark = self
            .conn
            .query_row(&sql, params![id], bookmark_from_row)
            .optional()?;
        Ok(bookmark)
    }

    /// Total number of bookmarks across all documents
    pub fn bookmark_count(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn query_document(conn: &Connection, document: &str) -> StorageResult<Vec<Bookmark>> {
    let sql = format!(
        "{} WHERE pdfUri = ? ORDER BY creationDate DESC, id DESC",
        SELECT_COLUMNS
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![document], bookmark_from_row)?;

    let mut bookmarks = Vec::new();
    for row in rows {
        bookmarks.push(row?);
    }
    Ok(bookmarks)
}

fn bookmark_from_row(row: &Row<'_>) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get(0)?,
        pdf_uri: row.get(1)?,
        page_index: row.get(2)?,
        title: row.get(3)?,
        summary: row.get(4)?,
        creation_date: row.get(5)?,
    })
}

/// Handle to a live bookmark query for one document
///
/// Dropping the handle cancels the subscription.
#[derive(Debug)]
pub struct BookmarkSubscription {
    document: String,
    rx: watch::Receiver<Vec<Bookmark>>,
    primed: bool,
}

impl BookmarkSubscription {
    /// Document this subscription follows
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Latest snapshot, marking it as seen
    pub fn latest(&mut self) -> Vec<Bookmark> {
        self.primed = true;
        self.rx.borrow_and_update().clone()
    }

    /// Whether a snapshot newer than the last one read is available
    pub fn has_changed(&self) -> bool {
        !self.primed || self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next snapshot
    ///
    /// The first call returns the snapshot held at subscription time.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Vec<Bookmark>> {
        if !self.primed {
            return Some(self.latest());
        }
        self.rx.changed().await.ok()?;
        Some(self.latest())
    }

    /// Convert into a stream of snapshots, starting with the current one
    pub fn into_stream(self) -> Pin<Box<dyn Stream<Item = Vec<Bookmark>> + Send>> {
        Box::pin(stream::unfold(self, |mut sub| async move {
            let snapshot = sub.changed().await?;
            Some((snapshot, sub))
        }))
    }

    /// End the subscription
    pub fn cancel(self) {
        debug!("Cancelled bookmark subscription for {}", self.document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use tempfile::TempDir;

    fn bookmark(doc: &str, page: u32, title: &str, ts: i64) -> Bookmark {
        Bookmark::new(doc, page, title, "").created_at(ts)
    }

    fn titles(bookmarks: &[Bookmark]) -> Vec<&str> {
        bookmarks.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn test_insert_auto_assigns_id() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        let b = Bookmark::new("doc://x", 3, "Intro", "first pages").created_at(100);

        let id = store.insert(&b).unwrap();
        assert!(id > 0);

        let listed = store.get_bookmarks("doc://x").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].title, "Intro");
        assert_eq!(listed[0].summary, "first pages");
        assert_eq!(listed[0].page_index, 3);
        assert_eq!(listed[0].creation_date, 100);
    }

    #[test]
    fn test_bookmarks_ordered_newest_first_per_document() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        store.insert(&bookmark("doc://x", 2, "Intro", 100)).unwrap();
        store
            .insert(&bookmark("doc://x", 5, "Conclusion", 200))
            .unwrap();

        let x = store.get_bookmarks("doc://x").unwrap();
        assert_eq!(titles(&x), vec!["Conclusion", "Intro"]);
        assert!(store.get_bookmarks("doc://y").unwrap().is_empty());
    }

    #[test]
    fn test_insert_with_existing_id_replaces() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        let id = store.insert(&bookmark("doc://x", 1, "Draft", 100)).unwrap();

        let mut replacement = bookmark("doc://x", 7, "Final", 150);
        replacement.id = id;
        assert_eq!(store.insert(&replacement).unwrap(), id);

        let listed = store.get_bookmarks("doc://x").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Final");
        assert_eq!(listed[0].page_index, 7);
    }

    #[test]
    fn test_delete_and_delete_missing() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        let id = store.insert(&bookmark("doc://x", 1, "A", 100)).unwrap();

        store.delete(id + 100).unwrap();
        assert_eq!(store.bookmark_count().unwrap(), 1);

        store.delete(id).unwrap();
        assert_eq!(store.bookmark_count().unwrap(), 0);
        assert!(store.get_bookmark(id).unwrap().is_none());
    }

    #[test]
    fn test_subscription_starts_with_snapshot() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        store.insert(&bookmark("doc://x", 1, "A", 100)).unwrap();

        let mut sub = store.bookmarks_for("doc://x").unwrap();
        assert!(sub.has_changed());
        assert_eq!(titles(&sub.latest()), vec!["A"]);
        assert!(!sub.has_changed());
    }

    #[test]
    fn test_subscription_follows_writes_for_its_document_only() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        let mut x = store.bookmarks_for("doc://x").unwrap();
        let mut y = store.bookmarks_for("doc://y").unwrap();
        x.latest();
        y.latest();

        let id = store.insert(&bookmark("doc://x", 1, "A", 100)).unwrap();
        assert!(x.has_changed());
        assert!(!y.has_changed());
        assert_eq!(titles(&x.latest()), vec!["A"]);

        store.insert(&bookmark("doc://x", 2, "B", 200)).unwrap();
        store.delete(id).unwrap();
        // Intermediate snapshot is superseded
        assert_eq!(titles(&x.latest()), vec!["B"]);
        assert!(y.latest().is_empty());
    }

    #[test]
    fn test_cancelled_subscription_is_pruned() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        let first = store.bookmarks_for("doc://x").unwrap();
        let _second = store.bookmarks_for("doc://x").unwrap();
        assert_eq!(store.subscriber_count(), 2);

        first.cancel();
        store.insert(&bookmark("doc://x", 1, "A", 100)).unwrap();
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bookmarks.db");

        {
            let mut store = BookmarkStore::open_path(&path).unwrap();
            store.insert(&bookmark("doc://x", 4, "Kept", 100)).unwrap();
        }

        let store = BookmarkStore::open_path(&path).unwrap();
        let listed = store.get_bookmarks("doc://x").unwrap();
        assert_eq!(titles(&listed), vec!["Kept"]);
    }

    #[tokio::test]
    async fn test_changed_waits_for_next_write() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        let mut sub = store.bookmarks_for("doc://x").unwrap();

        assert_eq!(sub.changed().await, Some(Vec::new()));

        store.insert(&bookmark("doc://x", 1, "A", 100)).unwrap();
        let next = sub.changed().await.unwrap();
        assert_eq!(titles(&next), vec!["A"]);
    }

    #[tokio::test]
    async fn test_stream_yields_current_then_updates_and_ends_with_store() {
        let mut store = BookmarkStore::open_in_memory().unwrap();
        store.insert(&bookmark("doc://x", 1, "A", 100)).unwrap();

        let mut stream = store.bookmarks_for("doc://x").unwrap().into_stream();
        assert_eq!(titles(&stream.next().await.unwrap()), vec!["A"]);

        store.insert(&bookmark("doc://x", 2, "B", 200)).unwrap();
        assert_eq!(titles(&stream.next().await.unwrap()), vec!["B", "A"]);

        drop(store);
        assert!(stream.next().await.is_none());
    }
}
