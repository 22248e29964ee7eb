//! Document session controller
//!
//! Drives a single-document reading session:
//!
//! ```text
//! Library ──open──▶ Loading ──surface loaded──▶ Loaded
//!    ▲                 │                           │
//!    └──back / access or decode failure ◀──────────┘
//! ```
//!
//! Opening a document (from the chooser or the recent list) always checks
//! access before touching any state. On success the document is recorded in
//! the recent list, its bookmark subscription replaces the previous one and
//! it is handed to the render surface.
//!
//! The render surface reports through three callback slots which forward
//! events, tagged with the session generation, into a channel. The host
//! drains that channel with `process_events` or `next_event`. Events from
//! an earlier generation belong to an abandoned session and are dropped.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::access::DocumentAccess;
use crate::models::{filter_bookmarks, Bookmark, RecentFileItem, UNKNOWN_FILE_NAME};
use crate::notification::Notification;
use crate::render::{RenderCallbacks, RenderEvent, RenderSurface};
use crate::storage::{BookmarkSubscription, FilePreferences, Preferences};
use crate::store::Store;

/// Where the session currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No document selected; the recent list is shown
    Library,
    /// Document handed to the surface, waiting for it to finish decoding
    Loading { document: String },
    /// Surface reported a successful decode
    Loaded { document: String, page_count: u32 },
}

impl SessionState {
    /// Reference of the selected document, if any
    pub fn document(&self) -> Option<&str> {
        match self {
            SessionState::Library => None,
            SessionState::Loading { document } | SessionState::Loaded { document, .. } => {
                Some(document)
            }
        }
    }
}

#[derive(Debug)]
struct TaggedEvent {
    generation: u64,
    event: RenderEvent,
}

/// Controller for one reading session at a time
pub struct SessionController<A, R, P = FilePreferences> {
    store: Store<P>,
    access: A,
    surface: R,
    state: SessionState,
    /// Last viewed page of the active session
    current_page: u32,
    /// Bumped whenever a session starts or ends
    generation: u64,
    subscription: Option<BookmarkSubscription>,
    bookmarks: Vec<Bookmark>,
    recent: Vec<RecentFileItem>,
    notifications: Vec<Notification>,
    events_tx: mpsc::UnboundedSender<TaggedEvent>,
    events_rx: mpsc::UnboundedReceiver<TaggedEvent>,
}

impl<A, R, P> SessionController<A, R, P>
where
    A: DocumentAccess,
    R: RenderSurface,
    P: Preferences,
{
    /// Create a controller in the library state
    pub fn new(store: Store<P>, access: A, surface: R) -> Self {
        let recent = store.recent_files();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            store,
            access,
            surface,
            state: SessionState::Library,
            current_page: 0,
            generation: 0,
            subscription: None,
            bookmarks: Vec::new(),
            recent,
            notifications: Vec::new(),
            events_tx,
            events_rx,
        }
    }

    // ==================== Accessors ====================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Reference of the selected document, if any
    pub fn document(&self) -> Option<&str> {
        self.state.document()
    }

    /// Zero-based page last viewed in this session
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Recently opened documents, most recent first
    pub fn recent_files(&self) -> &[RecentFileItem] {
        &self.recent
    }

    /// Drain pending user-visible messages
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn store(&self) -> &Store<P> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<P> {
        &mut self.store
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    /// `Page N of M` while a document is loaded
    pub fn page_label(&self) -> Option<String> {
        match &self.state {
            SessionState::Loaded { page_count, .. } => {
                Some(format!("Page {} of {}", self.current_page + 1, page_count))
            }
            _ => None,
        }
    }

    // ==================== Opening Documents ====================

    /// Open a document returned by the document chooser
    ///
    /// Returns `true` when the document was handed to the surface.
    pub fn open_chosen(&mut self, reference: &str) -> bool {
        info!("Opening chosen document {}", reference);

        if let Err(e) = self.access.request_persistent_access(reference) {
            warn!("Could not get access to {}: {}", reference, e);
            self.notify(Notification::CouldNotGetPermissions);
            self.close_session();
            return false;
        }

        let display_name = self
            .access
            .display_name(reference)
            .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string());
        self.record_recent(reference, &display_name);
        self.begin_loading(reference);
        true
    }

    /// Open a document from the recent list
    ///
    /// Access is verified before anything else changes; a document whose
    /// access was revoked is dropped from the list.
    pub fn open_recent(&mut self, reference: &str) -> bool {
        info!("Opening recent document {}", reference);

        if !self.access.has_access(reference) {
            warn!("Access lost for {}", reference);
            self.notify(Notification::PermissionLost);
            self.forget_recent(reference);
            self.close_session();
            return false;
        }

        let display_name = self
            .recent
            .iter()
            .find(|item| item.reference == reference)
            .map(|item| item.display_name.clone())
            .or_else(|| self.access.display_name(reference))
            .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string());
        self.record_recent(reference, &display_name);
        self.begin_loading(reference);
        true
    }

    /// Leave the reader and return to the library
    ///
    /// Returns `false` when already in the library, leaving the host to
    /// perform its default back action.
    pub fn go_back(&mut self) -> bool {
        if self.state == SessionState::Library {
            return false;
        }
        info!("Returning to library");
        self.close_session();
        true
    }

    fn begin_loading(&mut self, reference: &str) {
        self.cancel_subscription();
        self.generation += 1;
        self.current_page = 0;
        self.bookmarks.clear();

        match self.store.bookmarks_for(reference) {
            Ok(mut subscription) => {
                self.bookmarks = subscription.latest();
                self.subscription = Some(subscription);
            }
            Err(e) => warn!("{:#}", e),
        }

        self.state = SessionState::Loading {
            document: reference.to_string(),
        };
        debug!(
            "Loading {} (generation {}) at page {}",
            reference, self.generation, self.current_page
        );

        let callbacks = self.callbacks(self.generation);
        self.surface.load(reference, self.current_page, callbacks);
    }

    fn close_session(&mut self) {
        if self.state != SessionState::Library {
            self.surface.recycle();
        }
        self.cancel_subscription();
        self.generation += 1;
        self.current_page = 0;
        self.bookmarks.clear();
        self.state = SessionState::Library;
    }

    fn cancel_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    fn callbacks(&self, generation: u64) -> RenderCallbacks {
        let load_tx = self.events_tx.clone();
        let page_tx = self.events_tx.clone();
        let error_tx = self.events_tx.clone();

        // Send only fails once the controller is gone
        RenderCallbacks {
            on_load: Box::new(move |page_count| {
                let _ = load_tx.send(TaggedEvent {
                    generation,
                    event: RenderEvent::Loaded { page_count },
                });
            }),
            on_page_change: Box::new(move |page, page_count| {
                let _ = page_tx.send(TaggedEvent {
                    generation,
                    event: RenderEvent::PageChanged { page, page_count },
                });
            }),
            on_error: Box::new(move |message| {
                let _ = error_tx.send(TaggedEvent {
                    generation,
                    event: RenderEvent::Failed { message },
                });
            }),
        }
    }

    // ==================== Render Events ====================

    /// Apply every render event already delivered
    ///
    /// Returns how many events were received, stale ones included.
    pub fn process_events(&mut self) -> usize {
        let mut received = 0;
        while let Ok(tagged) = self.events_rx.try_recv() {
            self.apply(tagged);
            received += 1;
        }
        received
    }

    /// Wait for the next render event of the current session and apply it
    ///
    /// Events from abandoned sessions are skipped, never returned.
    pub async fn next_event(&mut self) -> Option<RenderEvent> {
        loop {
            let tagged = self.events_rx.recv().await?;
            let event = tagged.event.clone();
            if self.apply(tagged) {
                return Some(event);
            }
        }
    }

    /// Returns `false` when the event was dropped as stale
    fn apply(&mut self, tagged: TaggedEvent) -> bool {
        if tagged.generation != self.generation {
            debug!(
                "Ignoring {:?} from abandoned session {} (current {})",
                tagged.event, tagged.generation, self.generation
            );
            return false;
        }

        match tagged.event {
            RenderEvent::Loaded { page_count } => {
                let Some(document) = self.document().map(str::to_string) else {
                    return false;
                };
                if page_count > 0 && self.current_page >= page_count {
                    self.current_page = page_count - 1;
                }
                info!("Loaded {} ({} pages)", document, page_count);
                self.state = SessionState::Loaded {
                    document,
                    page_count,
                };
            }
            RenderEvent::PageChanged { page, page_count } => {
                self.current_page = page;
                if let SessionState::Loaded {
                    page_count: known, ..
                } = &mut self.state
                {
                    *known = page_count;
                }
            }
            RenderEvent::Failed { message } => {
                warn!("Failed to load {:?}: {}", self.document(), message);
                self.notify(Notification::ErrorLoadingDocument(message));
                self.close_session();
            }
        }
        true
    }

    // ==================== Bookmarks ====================

    /// Bookmarks of the current document, newest first
    pub fn bookmarks(&mut self) -> &[Bookmark] {
        self.sync_bookmarks();
        &self.bookmarks
    }

    /// Bookmarks of the current document matching `query`
    pub fn search_bookmarks(&mut self, query: &str) -> Vec<Bookmark> {
        self.sync_bookmarks();
        filter_bookmarks(&self.bookmarks, query)
    }

    /// Whether the bookmark list can be opened
    ///
    /// Requires a fully loaded document with at least one bookmark.
    pub fn can_show_bookmarks(&mut self) -> bool {
        self.sync_bookmarks();
        matches!(self.state, SessionState::Loaded { .. }) && !self.bookmarks.is_empty()
    }

    /// Bookmarks to list, or a notification explaining why there are none
    pub fn show_bookmarks(&mut self) -> Option<Vec<Bookmark>> {
        if self.document().is_none() {
            self.notify(Notification::OpenDocumentToSeeBookmarks);
            return None;
        }

        self.sync_bookmarks();
        if self.bookmarks.is_empty() {
            self.notify(Notification::NoBookmarksForDocument);
            return None;
        }
        Some(self.bookmarks.clone())
    }

    /// Bookmark the current page
    ///
    /// Title and summary are trimmed; an empty title is rejected. Returns
    /// the new bookmark id on success.
    pub fn add_bookmark(&mut self, title: &str, summary: &str) -> Option<i64> {
        let document = match &self.state {
            SessionState::Loaded { document, .. } => document.clone(),
            _ => {
                self.notify(Notification::LoadDocumentFirst);
                return None;
            }
        };

        let title = title.trim();
        if title.is_empty() {
            self.notify(Notification::BookmarkTitleEmpty);
            return None;
        }

        let bookmark = Bookmark::new(document, self.current_page, title, summary.trim());
        match self.store.add_bookmark(&bookmark) {
            Ok(id) => {
                self.notify(Notification::BookmarkAdded);
                self.sync_bookmarks();
                Some(id)
            }
            Err(e) => {
                warn!("{:#}", e);
                self.notify(Notification::ErrorSavingBookmark);
                None
            }
        }
    }

    /// Delete a bookmark by id
    pub fn delete_bookmark(&mut self, id: i64) -> bool {
        match self.store.delete_bookmark(id) {
            Ok(()) => {
                self.notify(Notification::BookmarkDeleted);
                self.sync_bookmarks();
                true
            }
            Err(e) => {
                warn!("{:#}", e);
                self.notify(Notification::ErrorDeletingBookmark);
                false
            }
        }
    }

    /// Move the surface to a bookmark of the loaded document
    pub fn jump_to_bookmark(&mut self, bookmark: &Bookmark) -> bool {
        let SessionState::Loaded {
            document,
            page_count,
        } = &self.state
        else {
            return false;
        };
        if *document != bookmark.pdf_uri {
            return false;
        }

        let page = bookmark.page_index.min(page_count.saturating_sub(1));
        self.current_page = page;
        self.surface.jump_to(page);
        true
    }

    fn sync_bookmarks(&mut self) {
        if let Some(subscription) = self.subscription.as_mut() {
            if subscription.has_changed() {
                self.bookmarks = subscription.latest();
            }
        }
    }

    // ==================== Recent Files ====================

    fn record_recent(&mut self, reference: &str, display_name: &str) {
        match self.store.touch_recent(reference, display_name) {
            Ok(items) => self.recent = items,
            Err(e) => {
                warn!("{:#}", e);
                self.notify(Notification::ErrorSavingRecentFiles);
            }
        }
    }

    fn forget_recent(&mut self, reference: &str) {
        match self.store.remove_recent(reference) {
            Ok(items) => self.recent = items,
            Err(e) => {
                warn!("{:#}", e);
                self.notify(Notification::ErrorSavingRecentFiles);
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        debug!("Notify: {}", notification);
        self.notifications.push(notification);
    }
}
