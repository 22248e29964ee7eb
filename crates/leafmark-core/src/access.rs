//! Document access layer
//!
//! The session controller never opens documents itself. It asks a
//! `DocumentAccess` implementation to grant durable read access to a
//! chosen reference and, later, whether that access is still valid.
//!
//! `FileSystemAccess` is the implementation for local files: a grant is
//! recorded in a `Preferences` namespace under `grantedDocuments` and stays
//! valid for as long as the file remains readable.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::storage::error::StorageError;
use crate::storage::prefs::Preferences;

/// Preference key holding granted references
pub const KEY_GRANTED_DOCUMENTS: &str = "grantedDocuments";

/// Errors raised while obtaining document access
#[derive(Error, Debug)]
pub enum AccessError {
    /// The platform refused access
    #[error("Access to '{reference}' was denied: {reason}")]
    Denied { reference: String, reason: String },

    /// The reference does not name a document this layer understands
    #[error("Unsupported document reference '{0}'")]
    Unsupported(String),

    /// The grant could not be recorded
    #[error("Failed to record access grant: {0}")]
    Storage(#[from] StorageError),
}

/// Grants and checks durable read access to documents
pub trait DocumentAccess {
    /// Request read access that survives restarts
    fn request_persistent_access(&mut self, reference: &str) -> Result<(), AccessError>;

    /// Whether previously granted access is still valid
    fn has_access(&self, reference: &str) -> bool;

    /// Human-readable name for the document, if one can be determined
    fn display_name(&self, reference: &str) -> Option<String>;
}

/// Resolve a plain path or `file://` URI to a filesystem path
///
/// Percent-escapes in URIs are decoded.
pub fn resolve_path(reference: &str) -> Option<PathBuf> {
    if let Some(rest) = reference.strip_prefix("file://") {
        if rest.is_empty() {
            return None;
        }
        return Url::parse(reference).ok()?.to_file_path().ok();
    }
    if reference.is_empty() || reference.contains("://") {
        return None;
    }
    Some(PathBuf::from(reference))
}

fn is_readable(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

/// Access to local files with grants persisted in preferences
#[derive(Debug)]
pub struct FileSystemAccess<P> {
    prefs: P,
}

impl<P: Preferences> FileSystemAccess<P> {
    pub fn new(prefs: P) -> Self {
        Self { prefs }
    }

    /// References currently holding a grant
    pub fn granted(&self) -> BTreeSet<String> {
        self.prefs.string_set(KEY_GRANTED_DOCUMENTS)
    }

    /// Drop the grant for a reference
    pub fn revoke(&mut self, reference: &str) -> Result<(), AccessError> {
        let mut granted = self.granted();
        if granted.remove(reference) {
            debug!("Revoking access to {}", reference);
            self.prefs.put_string_set(KEY_GRANTED_DOCUMENTS, granted)?;
        }
        Ok(())
    }
}

impl<P: Preferences> DocumentAccess for FileSystemAccess<P> {
    fn request_persistent_access(&mut self, reference: &str) -> Result<(), AccessError> {
        let path =
            resolve_path(reference).ok_or_else(|| AccessError::Unsupported(reference.to_string()))?;

        if let Err(e) = File::open(&path) {
            warn!("Cannot read {:?}: {}", path, e);
            return Err(AccessError::Denied {
                reference: reference.to_string(),
                reason: e.to_string(),
            });
        }
        if !path.is_file() {
            return Err(AccessError::Denied {
                reference: reference.to_string(),
                reason: "not a regular file".to_string(),
            });
        }

        let mut granted = self.granted();
        if granted.insert(reference.to_string()) {
            self.prefs.put_string_set(KEY_GRANTED_DOCUMENTS, granted)?;
        }
        debug!("Granted persistent access to {}", reference);
        Ok(())
    }

    fn has_access(&self, reference: &str) -> bool {
        if !self.granted().contains(reference) {
            return false;
        }
        resolve_path(reference)
            .map(|path| is_readable(&path))
            .unwrap_or(false)
    }

    fn display_name(&self, reference: &str) -> Option<String> {
        resolve_path(reference)?
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::prefs::{FilePreferences, MemoryPreferences, ReadOnlyPreferences};
    use tempfile::TempDir;

    fn pdf(temp_dir: &TempDir, name: &str) -> String {
        let path = temp_dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/tmp/a.pdf"), Some(PathBuf::from("/tmp/a.pdf")));
        assert_eq!(
            resolve_path("file:///tmp/a.pdf"),
            Some(PathBuf::from("/tmp/a.pdf"))
        );
        assert_eq!(resolve_path("content://docs/1"), None);
        assert_eq!(resolve_path(""), None);
        assert_eq!(resolve_path("file://"), None);
    }

    #[test]
    fn test_resolve_escaped_file_uri() {
        assert_eq!(
            resolve_path("file:///tmp/my%20doc.pdf"),
            Some(PathBuf::from("/tmp/my doc.pdf"))
        );

        let temp_dir = TempDir::new().unwrap();
        let path = pdf(&temp_dir, "annual report.pdf");
        let uri = format!("file://{}", path.replace(' ', "%20"));

        let mut access = FileSystemAccess::new(MemoryPreferences::new());
        access.request_persistent_access(&uri).unwrap();
        assert!(access.has_access(&uri));
        assert_eq!(access.display_name(&uri).as_deref(), Some("annual report.pdf"));
    }

    #[test]
    fn test_grant_readable_file() {
        let temp_dir = TempDir::new().unwrap();
        let reference = pdf(&temp_dir, "paper.pdf");
        let mut access = FileSystemAccess::new(MemoryPreferences::new());

        assert!(!access.has_access(&reference));
        access.request_persistent_access(&reference).unwrap();
        assert!(access.has_access(&reference));
        assert_eq!(access.display_name(&reference), Some("paper.pdf".to_string()));
    }

    #[test]
    fn test_missing_file_is_denied() {
        let temp_dir = TempDir::new().unwrap();
        let reference = temp_dir
            .path()
            .join("missing.pdf")
            .to_string_lossy()
            .into_owned();
        let mut access = FileSystemAccess::new(MemoryPreferences::new());

        let err = access.request_persistent_access(&reference).unwrap_err();
        assert!(matches!(err, AccessError::Denied { .. }));
        assert!(access.granted().is_empty());
    }

    #[test]
    fn test_directory_is_denied() {
        let temp_dir = TempDir::new().unwrap();
        let reference = temp_dir.path().to_string_lossy().into_owned();
        let mut access = FileSystemAccess::new(MemoryPreferences::new());

        assert!(access.request_persistent_access(&reference).is_err());
    }

    #[test]
    fn test_unsupported_scheme() {
        let mut access = FileSystemAccess::new(MemoryPreferences::new());
        let err = access
            .request_persistent_access("content://docs/1")
            .unwrap_err();
        assert!(matches!(err, AccessError::Unsupported(_)));
    }

    #[test]
    fn test_deleted_file_loses_access() {
        let temp_dir = TempDir::new().unwrap();
        let reference = pdf(&temp_dir, "gone.pdf");
        let mut access = FileSystemAccess::new(MemoryPreferences::new());
        access.request_persistent_access(&reference).unwrap();

        std::fs::remove_file(&reference).unwrap();
        assert!(!access.has_access(&reference));
    }

    #[test]
    fn test_revoke() {
        let temp_dir = TempDir::new().unwrap();
        let reference = pdf(&temp_dir, "paper.pdf");
        let mut access = FileSystemAccess::new(MemoryPreferences::new());
        access.request_persistent_access(&reference).unwrap();

        access.revoke(&reference).unwrap();
        assert!(!access.has_access(&reference));
    }

    #[test]
    fn test_grants_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        let reference = pdf(&temp_dir, "paper.pdf");
        let grants = temp_dir.path().join("grants.json");

        {
            let prefs = FilePreferences::open(&grants).unwrap();
            let mut access = FileSystemAccess::new(prefs);
            access.request_persistent_access(&reference).unwrap();
        }

        let access = FileSystemAccess::new(FilePreferences::open(&grants).unwrap());
        assert!(access.has_access(&reference));
    }

    #[test]
    fn test_unrecordable_grant_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let reference = pdf(&temp_dir, "paper.pdf");
        let mut access = FileSystemAccess::new(ReadOnlyPreferences::default());

        let err = access.request_persistent_access(&reference).unwrap_err();
        assert!(matches!(err, AccessError::Storage(_)));
    }
}
