//! In-memory store, also used as the file store's cache mirror.
//!
//! [`MemoryStore`] keeps everything in a `HashMap` protected by a `RwLock`.
//! It implements the full [`KeyValueStore`] trait with no value
//! restrictions and is suitable for tests, ephemeral state, and embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use stash_value::Value;

use crate::error::StoreResult;
use crate::keys::validate_key;
use crate::traits::KeyValueStore;

/// An in-memory implementation of [`KeyValueStore`].
///
/// Unlike the encoding backends, every value kind is accepted as-is: what
/// goes in comes out, including non-UTF-8 blobs and floats of any
/// magnitude. Data is lost when the store is dropped.
///
/// [`FileStore`](crate::file::FileStore) embeds one instance as its
/// optional read/write-through mirror.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys currently present.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no keys are present.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    // Entry-level operations, used by the trait impl below and by the file
    // store's mirror once the key has already been validated.

    pub(crate) fn insert_entry(&self, key: &str, value: Value) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), value);
    }

    pub(crate) fn lookup_entry(&self, key: &str) -> Option<Value> {
        self.entries.read().expect("lock poisoned").get(key).cloned()
    }

    pub(crate) fn contains_entry(&self, key: &str) -> bool {
        self.entries.read().expect("lock poisoned").contains_key(key)
    }

    pub(crate) fn remove_entry(&self, key: &str) -> bool {
        self.entries
            .write()
            .expect("lock poisoned")
            .remove(key)
            .is_some()
    }

    pub(crate) fn clear_entries(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.len())
            .finish()
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        validate_key(key)?;
        self.insert_entry(key, value);
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        validate_key(key)?;
        Ok(self.lookup_entry(key))
    }

    fn contains(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(self.contains_entry(key))
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(self.remove_entry(key))
    }

    fn clear(&self) -> StoreResult<()> {
        self.clear_entries();
        Ok(())
    }
}
