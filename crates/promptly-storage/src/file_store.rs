//! File-based KeyValueStore implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use promptly_core::{Error, KeyValueStore, Result};

use crate::atomic_writer::write_atomically;

/// Key-value store persisted as a JSON object on disk
///
/// The whole map is held in memory and rewritten on every mutation; the
/// store only ever holds a handful of small entries.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the store at `path`, loading existing entries if the file exists
    ///
    /// # Errors
    /// - `Error::Io` if the file exists but can't be read
    /// - `Error::Storage` if the file isn't a JSON object of strings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| {
                    error!("Failed to parse storage file {}: {}", path.display(), e);
                    Error::Storage(format!("Invalid storage file {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        info!(
            "Opened key-value store at {} ({} entries)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| Error::Storage(format!("Storage lock poisoned: {}", e)))
    }

    /// Write `next` to disk, then adopt it as the in-memory state
    fn commit(
        &self,
        entries: &mut MutexGuard<'_, BTreeMap<String, String>>,
        next: BTreeMap<String, String>,
    ) -> Result<()> {
        let contents = serde_json::to_vec_pretty(&next)?;
        write_atomically(&self.path, &contents).map_err(|e| {
            error!("Failed to persist storage file {}: {}", self.path.display(), e);
            e
        })?;
        **entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.commit(&mut entries, next)?;

        debug!("Stored key '{}'", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.lock()?;
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);
        self.commit(&mut entries, next)?;

        debug!("Removed key '{}'", key);
        Ok(())
    }
}
