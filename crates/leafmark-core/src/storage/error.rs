//! Storage errors
//!
//! Failures of the bookmark database and the preference files. I/O errors
//! are classified so the CLI can print a hint next to the message.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the bookmark database and preference files
#[derive(Error, Debug)]
pub enum StorageError {
    /// The data directory (or a parent of a store file) could not be created
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied for '{path}'")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No space left while writing '{path}'")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A preferences file exists but could not be read
    #[error("Failed to read preferences '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Replacing a preferences file (or moving a corrupt one aside) failed
    #[error("Could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Bookmark database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Preferences encoding error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ if is_disk_full(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// What the user can do about it, when there is something to do
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } | StorageError::CreateDirectory { .. } => Some(
                "Check the permissions of the data directory, or point LEAFMARK_DATA_DIR elsewhere.",
            ),
            StorageError::Database(_) => {
                Some("If the bookmark database is damaged, move bookmarks.db aside to start fresh.")
            }
            _ => None,
        }
    }
}

fn is_disk_full(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left") || msg.contains("disk full") || msg.contains("quota exceeded")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_classification() {
        let denied = StorageError::from_io(
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            PathBuf::from("/data/preferences.json"),
        );
        assert!(matches!(denied, StorageError::PermissionDenied { .. }));
        assert!(denied.recovery_suggestion().is_some());

        let missing = StorageError::from_io(
            io::Error::new(io::ErrorKind::NotFound, "gone"),
            PathBuf::from("/data/grants.json"),
        );
        assert!(matches!(missing, StorageError::NotFound { .. }));
        assert!(missing.recovery_suggestion().is_none());
    }

    #[test]
    fn test_disk_full_detection() {
        let err = StorageError::from_io(
            io::Error::new(io::ErrorKind::Other, "No space left on device"),
            PathBuf::from("/data/preferences.json.tmp"),
        );

        assert!(matches!(err, StorageError::DiskFull { .. }));
        assert_eq!(
            err.recovery_suggestion(),
            Some("Free up disk space and try again.")
        );
    }

    #[test]
    fn test_other_io_is_write_error() {
        let err = StorageError::from_io(
            io::Error::new(io::ErrorKind::Other, "device busy"),
            PathBuf::from("/busy"),
        );

        assert!(matches!(err, StorageError::WriteError { .. }));
        assert!(err.to_string().contains("/busy"));
    }

    #[test]
    fn test_database_error_conversion() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.to_string().starts_with("Bookmark database error"));
        assert!(err.recovery_suggestion().is_some());
    }
}
