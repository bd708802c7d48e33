//! In-memory object store for testing.

use crate::error::StoreResult;
use crate::store::ObjectStore;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory object store.
///
/// This store holds all objects in memory and is suitable for:
/// - Unit tests
/// - Integration tests simulating multiple managers over one bucket
/// - Ephemeral runs that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads, which is
/// how the session tests simulate concurrent automation jobs.
///
/// # Example
///
/// ```rust
/// use careerdb_store::{InMemoryStore, ObjectStore};
///
/// let store = InMemoryStore::new();
/// store.put("career_data.db", b"bytes").unwrap();
/// assert_eq!(store.keys(), vec!["career_data.db".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all keys currently in the store.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Removes every object from the store.
    pub fn clear(&self) {
        self.objects.write().clear();
    }
}

impl ObjectStore for InMemoryStore {
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.objects.read().contains_key(key))
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.objects.read().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        self.objects.write().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
