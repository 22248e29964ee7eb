//! Transient user-visible messages
//!
//! Failures in user flows are handled where they happen and turned into a
//! `Notification` for the host to show briefly. None of them are fatal.

use std::fmt;

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Durable access to a chosen document could not be obtained
    CouldNotGetPermissions,
    /// Access to a recent document has been revoked
    PermissionLost,
    /// The render surface failed to decode the document
    ErrorLoadingDocument(String),
    /// The recent-files list could not be saved
    ErrorSavingRecentFiles,
    /// A bookmark was requested without a loaded document
    LoadDocumentFirst,
    /// The bookmark title was empty after trimming
    BookmarkTitleEmpty,
    BookmarkAdded,
    ErrorSavingBookmark,
    BookmarkDeleted,
    ErrorDeletingBookmark,
    /// The bookmark list was requested without an open document
    OpenDocumentToSeeBookmarks,
    NoBookmarksForDocument,
}

impl Notification {
    /// Whether the message reports a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notification::CouldNotGetPermissions
                | Notification::PermissionLost
                | Notification::ErrorLoadingDocument(_)
                | Notification::ErrorSavingRecentFiles
                | Notification::ErrorSavingBookmark
                | Notification::ErrorDeletingBookmark
        )
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::CouldNotGetPermissions => {
                write!(f, "Could not get permission to read this file")
            }
            Notification::PermissionLost => {
                write!(f, "Permission for this file was lost. Please reopen it.")
            }
            Notification::ErrorLoadingDocument(reason) => {
                write!(f, "Error loading PDF: {}", reason)
            }
            Notification::ErrorSavingRecentFiles => write!(f, "Could not update recent files"),
            Notification::LoadDocumentFirst => write!(f, "Load a PDF first"),
            Notification::BookmarkTitleEmpty => write!(f, "Bookmark title cannot be empty"),
            Notification::BookmarkAdded => write!(f, "Bookmark added"),
            Notification::ErrorSavingBookmark => write!(f, "Error saving bookmark"),
            Notification::BookmarkDeleted => write!(f, "Bookmark deleted"),
            Notification::ErrorDeletingBookmark => write!(f, "Error deleting bookmark"),
            Notification::OpenDocumentToSeeBookmarks => {
                write!(f, "Open a PDF to view its bookmarks")
            }
            Notification::NoBookmarksForDocument => write!(f, "No bookmarks saved for this PDF"),
        }
    }
}
