//! Open command handlers

use anyhow::{bail, Result};

use leafmark_core::models::{now_millis, UNKNOWN_FILE_NAME};
use leafmark_core::{Config, Notification, RecentFileItem, SessionState};

use crate::commands::{document_reference, session, CliSession};
use crate::output::Output;

/// Open a document by path, granting access and recording it in recents
pub fn open(config: &Config, path: &str, output: &Output) -> Result<()> {
    let reference = document_reference(path);
    let mut session = session(config)?;
    session.open_chosen(&reference);
    report(session, &reference, output)
}

/// Reopen a document from the recent list
pub fn open_recent(config: &Config, reference: &str, output: &Output) -> Result<()> {
    let mut session = session(config)?;
    session.open_recent(reference);
    report(session, reference, output)
}

fn report(mut session: CliSession, reference: &str, output: &Output) -> Result<()> {
    session.process_events();
    let notifications = session.take_notifications();

    let SessionState::Loaded { page_count, .. } = *session.state() else {
        match notifications.into_iter().find(Notification::is_error) {
            Some(notification) => bail!("{}", notification),
            None => bail!("Could not open {}", reference),
        }
    };

    for notification in &notifications {
        output.notify(notification);
    }

    let item = session
        .recent_files()
        .iter()
        .find(|item| item.reference == reference)
        .cloned()
        .unwrap_or_else(|| RecentFileItem::new(reference, UNKNOWN_FILE_NAME, now_millis()));
    output.print_opened(&item, page_count);

    Ok(())
}
