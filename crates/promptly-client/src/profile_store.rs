//! Currently selected profile
//!
//! Only the profile id is persisted; the full record lives in memory and is
//! re-resolved by the host after a restart via [`SelectedProfileStore::stored_id`].

use std::sync::Arc;
use tracing::{debug, warn};

use promptly_core::models::Profile;
use promptly_core::storage::SELECTED_PROFILE_KEY;
use promptly_core::{KeyValueStore, Observable, Subscription};

pub struct SelectedProfileStore {
    storage: Arc<dyn KeyValueStore>,
    state: Observable<Option<Profile>>,
}

impl SelectedProfileStore {
    /// Start with no profile selected. Storage is left as is.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            state: Observable::new(None),
        }
    }

    pub fn get(&self) -> Option<Profile> {
        self.state.get()
    }

    pub fn subscribe(&self) -> Subscription<Option<Profile>> {
        self.state.subscribe()
    }

    /// Select `profile`, persisting its id.
    ///
    /// Persisting is best effort: a storage failure is logged and the
    /// in-memory selection still changes. Selecting `None` keeps the
    /// persisted id.
    pub fn set(&self, profile: Option<Profile>) {
        if let Some(profile) = &profile {
            if let Err(e) = self.storage.set(SELECTED_PROFILE_KEY, &profile.id) {
                warn!(profile_id = %profile.id, "Failed to persist selected profile: {}", e);
            }
            debug!(profile_id = %profile.id, "Profile selected");
        }
        self.state.set(profile);
    }

    /// Deselect in memory. The persisted id is kept.
    pub fn clear(&self) {
        self.state.set(None);
    }

    /// Mutate the in-memory selection. Storage is not touched.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Option<Profile>),
    {
        self.state.update(f);
    }

    /// Id persisted by an earlier selection, if readable
    pub fn stored_id(&self) -> Option<String> {
        match self.storage.get(SELECTED_PROFILE_KEY) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!("Failed to read selected profile: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptly_core::{Error, MemoryKeyValueStore, Result};

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            name: format!("Profile {}", id),
            description: None,
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Storage("disk gone".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("disk gone".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(Error::Storage("disk gone".to_string()))
        }
    }

    #[test]
    fn test_set_persists_id() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = SelectedProfileStore::new(storage.clone());
        assert_eq!(store.get(), None);

        store.set(Some(profile("p1")));
        assert_eq!(store.get(), Some(profile("p1")));
        assert_eq!(storage.get(SELECTED_PROFILE_KEY).unwrap().as_deref(), Some("p1"));
        assert_eq!(store.stored_id().as_deref(), Some("p1"));
    }

    #[test]
    fn test_set_none_keeps_persisted_id() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = SelectedProfileStore::new(storage.clone());

        store.set(Some(profile("p1")));
        store.set(None);

        assert_eq!(store.get(), None);
        assert_eq!(store.stored_id().as_deref(), Some("p1"));
    }

    #[test]
    fn test_clear_keeps_persisted_id() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = SelectedProfileStore::new(storage.clone());

        store.set(Some(profile("p1")));
        store.clear();

        assert_eq!(store.get(), None);
        assert_eq!(storage.get(SELECTED_PROFILE_KEY).unwrap().as_deref(), Some("p1"));
    }

    #[test]
    fn test_update_is_memory_only() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = SelectedProfileStore::new(storage.clone());
        store.set(Some(profile("p1")));

        store.update(|current| *current = Some(profile("p2")));

        assert_eq!(store.get().unwrap().id, "p2");
        assert_eq!(store.stored_id().as_deref(), Some("p1"));
    }

    #[test]
    fn test_storage_failure_still_selects() {
        let store = SelectedProfileStore::new(Arc::new(BrokenStore));

        store.set(Some(profile("p2")));
        assert_eq!(store.get(), Some(profile("p2")));
        assert_eq!(store.stored_id(), None);

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_selection_changes() {
        let store = SelectedProfileStore::new(Arc::new(MemoryKeyValueStore::new()));
        let mut subscription = store.subscribe();
        assert_eq!(subscription.next().await, Some(None));

        store.set(Some(profile("p3")));
        assert_eq!(subscription.next().await, Some(Some(profile("p3"))));
    }
}
