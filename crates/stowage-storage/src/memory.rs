use std::fmt;

use crate::container::Container;
use crate::error::StorageResult;
use crate::mode::Immediate;
use crate::traits::{Entries, StorageAdapter, StorageKey, StorageValue};

/// In-memory adapter with no backend.
///
/// Intended for tests and ephemeral state. `load` and `save` are no-ops, so
/// the container lives exactly as long as the adapter.
pub struct MemoryAdapter<K, V> {
    container: Container<K, V>,
}

impl<K: StorageKey, V: StorageValue> MemoryAdapter<K, V> {
    /// Create an adapter holding `entries`.
    pub fn new(entries: Entries<K, V>) -> Self {
        Self {
            container: Container::new(entries),
        }
    }

    /// Create an empty adapter.
    pub fn empty() -> Self {
        Self::new(Entries::new())
    }
}

impl<K: StorageKey, V: StorageValue> Default for MemoryAdapter<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: StorageKey, V: StorageValue> StorageAdapter<K, V> for MemoryAdapter<K, V> {
    type Mode = Immediate;

    fn size(&self) -> usize {
        self.container.len()
    }

    fn is_locked(&self) -> bool {
        self.container.is_locked()
    }

    fn lock(&self) {
        self.container.set_locked(true);
    }

    fn unlock(&self) {
        self.container.set_locked(false);
    }

    fn has(&self, key: &K) -> bool {
        self.container.has(key)
    }

    fn get(&self, key: &K) -> Option<V> {
        self.container.get(key)
    }

    fn keys(&self) -> Vec<K> {
        self.container.keys()
    }

    fn values(&self) -> Vec<V> {
        self.container.values()
    }

    fn entries(&self) -> Vec<(K, V)> {
        self.container.entries()
    }

    fn for_each<'a, F>(&'a self, mut callback: F)
    where
        F: FnMut(&V, &K) + Send + 'a,
    {
        for (key, value) in self.container.entries() {
            callback(&value, &key);
        }
    }

    fn add(&self, key: K, value: V) -> StorageResult<bool> {
        Ok(self.container.add(key, value))
    }

    fn put(&self, key: K, value: V) -> StorageResult<bool> {
        Ok(self.container.put(key, value))
    }

    fn update(&self, key: K, value: V) -> StorageResult<bool> {
        Ok(self.container.update(key, value))
    }

    fn delete(&self, key: &K) -> StorageResult<bool> {
        Ok(self.container.delete(key))
    }

    fn set(&self, entries: Entries<K, V>) -> StorageResult<bool> {
        Ok(self.container.replace(entries))
    }

    fn load(&self) -> StorageResult<()> {
        Ok(())
    }

    fn save(&self) -> StorageResult<()> {
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.container.reset();
        Ok(())
    }

    fn destroy(&self) -> StorageResult<()> {
        self.clear()
    }
}

impl<K: StorageKey, V: StorageValue> fmt::Debug for MemoryAdapter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAdapter")
            .field("size", &self.container.len())
            .field("locked", &self.container.is_locked())
            .finish()
    }
}
