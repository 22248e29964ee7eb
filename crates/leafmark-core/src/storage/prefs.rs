//! Key-value preference storage
//!
//! A small namespace of string-set values, the shape the recent-files list
//! and the access grants are persisted in. Every write replaces the value
//! for its key in full.
//!
//! `FilePreferences` keeps the namespace in a JSON file and writes it
//! atomically (write to temp file, then rename). `MemoryPreferences` keeps
//! it in memory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};

/// A process-wide namespace of string-set values
pub trait Preferences {
    /// Values stored under `key`; empty when the key was never written
    fn string_set(&self, key: &str) -> BTreeSet<String>;

    /// Replace the values stored under `key`
    ///
    /// On error the previously stored values remain in effect.
    fn put_string_set(&mut self, key: &str, values: BTreeSet<String>) -> StorageResult<()>;
}

/// In-memory preferences
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn string_set(&self, key: &str) -> BTreeSet<String> {
        self.values.get(key).cloned().unwrap_or_default()
    }

    fn put_string_set(&mut self, key: &str, values: BTreeSet<String>) -> StorageResult<()> {
        self.values.insert(key.to_string(), values);
        Ok(())
    }
}

/// Preferences persisted to a JSON file
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, BTreeSet<String>>,
}

impl FilePreferences {
    /// Open the preferences file, starting empty if it doesn't exist
    ///
    /// A file that cannot be parsed is moved aside to `<name>.corrupt.backup`
    /// and the namespace starts empty.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if !path.exists() {
            debug!("No preferences at {:?}, starting empty", path);
            return Ok(Self {
                path,
                values: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|source| StorageError::ReadError {
            path: path.clone(),
            source,
        })?;

        let values = match serde_json::from_str(&content) {
            Ok(values) => values,
            Err(e) => {
                let backup = backup_path(&path);
                warn!(
                    "Preferences at {:?} are unreadable ({}), moving them to {:?}",
                    path, e, backup
                );
                fs::rename(&path, &backup).map_err(|source| StorageError::AtomicWriteFailed {
                    from: path.clone(),
                    to: backup,
                    source,
                })?;
                BTreeMap::new()
            }
        };

        Ok(Self { path, values })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Preferences for FilePreferences {
    fn string_set(&self, key: &str) -> BTreeSet<String> {
        self.values.get(key).cloned().unwrap_or_default()
    }

    fn put_string_set(&mut self, key: &str, values: BTreeSet<String>) -> StorageResult<()> {
        let mut next = self.values.clone();
        next.insert(key.to_string(), values);

        let json = serde_json::to_vec_pretty(&next)?;
        atomic_write(&self.path, &json)?;

        self.values = next;
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt.backup");
    path.with_file_name(name)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Preferences whose writes always fail, for exercising error paths
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ReadOnlyPreferences {
    pub(crate) inner: MemoryPreferences,
}

#[cfg(test)]
impl Preferences for ReadOnlyPreferences {
    fn string_set(&self, key: &str) -> BTreeSet<String> {
        self.inner.string_set(key)
    }

    fn put_string_set(&mut self, _key: &str, _values: BTreeSet<String>) -> StorageResult<()> {
        Err(StorageError::from_io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            PathBuf::from("read-only-preferences"),
        ))
    }
}
