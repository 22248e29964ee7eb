//! Recently opened documents
//!
//! The list lives in a `Preferences` namespace under `recentFiles` as a set
//! of `reference|displayName|lastAccessedMillis` records. It is deduplicated
//! by reference, capped at `MAX_RECENT_FILES` and ordered most recent first.
//! Every mutation rewrites the whole set.
//!
//! The reference is percent-encoded so it may itself contain `|`. Records
//! written before timestamps were tracked (`reference|displayName`) still
//! load, with a timestamp of 0.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::models::{now_millis, RecentFileItem};
use crate::storage::error::StorageResult;
use crate::storage::prefs::Preferences;

/// Preference key holding the recent-files records
pub const KEY_RECENT_FILES: &str = "recentFiles";

/// Maximum number of documents remembered
pub const MAX_RECENT_FILES: usize = 20;

const SEPARATOR: char = '|';

/// Parse one persisted record
///
/// Returns `None` for records without a separator or with an empty reference.
pub fn parse_record(record: &str) -> Option<RecentFileItem> {
    let (encoded, rest) = record.split_once(SEPARATOR)?;
    if encoded.is_empty() {
        return None;
    }
    let reference = match urlencoding::decode(encoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => encoded.to_string(),
    };

    let (display_name, last_accessed) = match rest.rsplit_once(SEPARATOR) {
        Some((name, ts)) => match ts.trim().parse::<i64>() {
            Ok(ts) => (name, ts),
            Err(_) => (rest, 0),
        },
        None => (rest, 0),
    };

    Some(RecentFileItem::new(reference, display_name, last_accessed))
}

/// Serialize an item into its persisted record
pub fn format_record(item: &RecentFileItem) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        urlencoding::encode(&item.reference),
        item.display_name,
        item.last_accessed,
        sep = SEPARATOR
    )
}

/// Repository for the recent-files list
#[derive(Debug)]
pub struct RecentFiles<P> {
    prefs: P,
}

impl<P: Preferences> RecentFiles<P> {
    pub fn new(prefs: P) -> Self {
        Self { prefs }
    }

    /// Get the backing preferences
    pub fn preferences(&self) -> &P {
        &self.prefs
    }

    /// Load the persisted list, most recent first
    ///
    /// Malformed records are skipped.
    pub fn load(&self) -> Vec<RecentFileItem> {
        let mut items: Vec<RecentFileItem> = self
            .prefs
            .string_set(KEY_RECENT_FILES)
            .iter()
            .filter_map(|record| {
                let parsed = parse_record(record);
                if parsed.is_none() {
                    debug!("Skipping malformed recent-file record {:?}", record);
                }
                parsed
            })
            .collect();

        // Two records for one reference can only come from a hand-edited
        // store; keep the newest.
        items.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        let mut seen = BTreeSet::new();
        items.retain(|item| seen.insert(item.reference.clone()));

        items
    }

    /// Record that a document was opened
    ///
    /// The entry moves to the front with a timestamp newer than every other
    /// entry; the oldest entries beyond `MAX_RECENT_FILES` are dropped.
    pub fn touch(
        &mut self,
        reference: &str,
        display_name: &str,
    ) -> StorageResult<Vec<RecentFileItem>> {
        let mut items = self.load();
        items.retain(|item| item.reference != reference);

        let newest = items.first().map(|item| item.last_accessed).unwrap_or(0);
        let last_accessed = now_millis().max(newest.saturating_add(1));

        items.insert(0, RecentFileItem::new(reference, display_name, last_accessed));
        if items.len() > MAX_RECENT_FILES {
            debug!(
                "Dropping {} recent file(s) beyond the limit",
                items.len() - MAX_RECENT_FILES
            );
            items.truncate(MAX_RECENT_FILES);
        }

        self.persist(&items)?;
        Ok(items)
    }

    /// Forget a document
    pub fn remove(&mut self, reference: &str) -> StorageResult<Vec<RecentFileItem>> {
        let mut items = self.load();
        let before = items.len();
        items.retain(|item| item.reference != reference);

        if items.len() != before {
            info!("Removed {} from recent files", reference);
        }

        self.persist(&items)?;
        Ok(items)
    }

    fn persist(&mut self, items: &[RecentFileItem]) -> StorageResult<()> {
        let records: BTreeSet<String> = items.iter().map(format_record).collect();
        self.prefs.put_string_set(KEY_RECENT_FILES, records)
    }
}
