//! Command handlers

pub mod bookmark;
pub mod config;
pub mod open;
pub mod recent;

use std::fs;

use anyhow::{Context, Result};

use leafmark_core::access::resolve_path;
use leafmark_core::{Config, FilePreferences, FileSystemAccess, SessionController, Store};

use crate::surface::HeadlessSurface;

/// Session controller as wired up for the command line
pub type CliSession = SessionController<FileSystemAccess<FilePreferences>, HeadlessSurface>;

/// Open a session over the configured stores
pub fn session(config: &Config) -> Result<CliSession> {
    let store = Store::open_with_config(config.clone())?;
    let grants = FilePreferences::open(config.grants_path())
        .context("Failed to open access grants")?;

    Ok(SessionController::new(
        store,
        FileSystemAccess::new(grants),
        HeadlessSurface::new(),
    ))
}

/// Turn a command-line argument into a stable document reference
///
/// Existing local files are referenced by their canonical path so the same
/// document opened from different directories shares recents and bookmarks.
pub fn document_reference(arg: &str) -> String {
    resolve_path(arg)
        .and_then(|path| fs::canonicalize(path).ok())
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| arg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_reference() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.pdf");
        fs::write(&path, b"%PDF-").unwrap();

        let canonical = fs::canonicalize(&path).unwrap().display().to_string();
        assert_eq!(document_reference(path.to_str().unwrap()), canonical);
        assert_eq!(
            document_reference(&format!("file://{}", path.display())),
            canonical
        );
        assert_eq!(document_reference("doc://remote/1"), "doc://remote/1");
        assert_eq!(document_reference("/missing/b.pdf"), "/missing/b.pdf");
    }
}
