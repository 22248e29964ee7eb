//! Recent-files command handlers

use anyhow::{bail, Result};

use leafmark_core::Store;

use crate::output::Output;

/// List recently opened documents, most recent first
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let items = store.recent_files();
    output.print_recent(&items);
    Ok(())
}

/// Forget a document without touching its bookmarks
pub fn remove(store: &mut Store, reference: String, output: &Output) -> Result<()> {
    let before = store.recent_files().len();
    let after = store.remove_recent(&reference)?;

    if after.len() == before {
        bail!("Not in recent files: {}", reference);
    }

    output.success(&format!("Removed from recent files: {}", reference));
    Ok(())
}
