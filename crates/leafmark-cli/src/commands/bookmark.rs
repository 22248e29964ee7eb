//! Bookmark command handlers

use anyhow::{anyhow, bail, Context, Result};

use leafmark_core::{Bookmark, Notification, Store};

use crate::commands::document_reference;
use crate::output::Output;
use crate::prompt::confirm;

/// Bookmark a page of a document
///
/// `page` is one-based, as printed in bookmark lists.
pub fn add(
    store: &mut Store,
    document: String,
    page: u32,
    title: String,
    summary: Option<String>,
    output: &Output,
) -> Result<()> {
    if page == 0 {
        bail!("Page numbers start at 1");
    }
    let title = title.trim();
    if title.is_empty() {
        bail!("{}", Notification::BookmarkTitleEmpty);
    }
    let summary = summary.as_deref().map(str::trim).unwrap_or_default();

    let reference = document_reference(&document);
    let bookmark = Bookmark::new(reference, page - 1, title, summary);
    let id = store.add_bookmark(&bookmark)?;

    let saved = store
        .get_bookmark(id)?
        .ok_or_else(|| anyhow!("Bookmark {} vanished after saving", id))?;

    output.success(&format!("Added bookmark: {}", id));
    output.print_bookmark(&saved);

    Ok(())
}

/// List a document's bookmarks, optionally filtered
pub fn list(
    store: &Store,
    document: String,
    search: Option<String>,
    output: &Output,
) -> Result<()> {
    let reference = document_reference(&document);
    let bookmarks = match search {
        Some(ref query) => store.search_bookmarks(&reference, query)?,
        None => store.get_bookmarks(&reference)?,
    };

    output.print_bookmarks(&bookmarks);
    Ok(())
}

/// Delete a bookmark by id
pub fn delete(store: &mut Store, id: i64, output: &Output) -> Result<()> {
    let bookmark = store
        .get_bookmark(id)?
        .ok_or_else(|| anyhow!("Bookmark not found: {}", id))?;

    // Confirm deletion
    if output.should_prompt() {
        println!("Delete bookmark: {}", bookmark.display_label());
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_bookmark(id)
        .context("Failed to delete bookmark")?;

    output.success(&format!("Deleted bookmark: {}", id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use leafmark_core::Config;
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn setup() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            log_file: None,
        };
        let store = Store::open_with_config(config).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_add_converts_page_and_trims() {
        let (_temp_dir, mut store) = setup();
        add(
            &mut store,
            "doc://paper".to_string(),
            3,
            "  Results ".to_string(),
            Some(" table 2 ".to_string()),
            &quiet(),
        )
        .unwrap();

        let bookmarks = store.get_bookmarks("doc://paper").unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].page_index, 2);
        assert_eq!(bookmarks[0].title, "Results");
        assert_eq!(bookmarks[0].summary, "table 2");
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let (_temp_dir, mut store) = setup();

        let err = add(&mut store, "doc://p".into(), 1, "  ".into(), None, &quiet()).unwrap_err();
        assert_eq!(err.to_string(), "Bookmark title cannot be empty");
        assert!(add(&mut store, "doc://p".into(), 0, "T".into(), None, &quiet()).is_err());
        assert_eq!(store.bookmark_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_in_quiet_mode() {
        let (_temp_dir, mut store) = setup();
        let id = store
            .add_bookmark(&Bookmark::new("doc://p", 0, "A", ""))
            .unwrap();

        delete(&mut store, id, &quiet()).unwrap();
        assert_eq!(store.bookmark_count().unwrap(), 0);
        assert!(delete(&mut store, id, &quiet()).is_err());
    }
}
