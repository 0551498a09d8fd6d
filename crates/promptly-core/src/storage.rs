//! Durable key-value storage abstraction
//!
//! The `KeyValueStore` trait stands in for the browser's local storage: a
//! small synchronous string map that survives restarts. The in-memory
//! implementation here backs tests and ephemeral sessions; the file-backed
//! one lives in `promptly-storage`.

use dashmap::DashMap;

use crate::Result;

/// Storage key holding the bearer token
pub const TOKEN_KEY: &str = "jwt_token";

/// Storage key holding the id of the selected profile
pub const SELECTED_PROFILE_KEY: &str = "selectedProfileId";

/// Synchronous string key-value store
///
/// Implementations:
/// - `MemoryKeyValueStore`: process-local map
/// - `FileKeyValueStore`: JSON file, written through on every mutation
///
/// # Example
/// ```
/// # use promptly_core::storage::{KeyValueStore, MemoryKeyValueStore, TOKEN_KEY};
/// # fn example() -> promptly_core::Result<()> {
/// let store = MemoryKeyValueStore::new();
/// store.set(TOKEN_KEY, "eyJ...")?;
/// assert_eq!(store.get(TOKEN_KEY)?.as_deref(), Some("eyJ..."));
/// # Ok(())
/// # }
/// ```
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    /// - `Error::Storage` if the backing medium can't be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    /// - `Error::Storage` / `Error::Io` if the write can't be made durable
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: DashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
