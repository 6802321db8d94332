use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::{Entries, StorageKey, StorageValue};

/// Lock-gated in-memory entries shared by the bundled adapters.
///
/// Mutators return `true` only when they changed the container; the caller
/// persists in that case and only in that case.
pub(crate) struct Container<K, V> {
    entries: RwLock<Entries<K, V>>,
    locked: AtomicBool,
}

impl<K: StorageKey, V: StorageValue> Container<K, V> {
    pub(crate) fn new(entries: Entries<K, V>) -> Self {
        Self {
            entries: RwLock::new(entries),
            locked: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries<K, V>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries<K, V>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    pub(crate) fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::Release);
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    pub(crate) fn has(&self, key: &K) -> bool {
        self.read().contains_key(key)
    }

    pub(crate) fn get(&self, key: &K) -> Option<V> {
        self.read().get(key).cloned()
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.read().keys().cloned().collect()
    }

    pub(crate) fn values(&self) -> Vec<V> {
        self.read().values().cloned().collect()
    }

    pub(crate) fn entries(&self) -> Vec<(K, V)> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn snapshot(&self) -> Entries<K, V> {
        self.read().clone()
    }

    pub(crate) fn add(&self, key: K, value: V) -> bool {
        if self.is_locked() {
            return false;
        }
        let mut entries = self.write();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, value);
        true
    }

    pub(crate) fn put(&self, key: K, value: V) -> bool {
        if self.is_locked() {
            return false;
        }
        self.write().insert(key, value);
        true
    }

    pub(crate) fn update(&self, key: K, value: V) -> bool {
        if self.is_locked() {
            return false;
        }
        match self.write().get_mut(&key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn delete(&self, key: &K) -> bool {
        if self.is_locked() {
            return false;
        }
        self.write().remove(key).is_some()
    }

    /// Gated replacement used by `set`.
    pub(crate) fn replace(&self, entries: Entries<K, V>) -> bool {
        if self.is_locked() {
            return false;
        }
        *self.write() = entries;
        true
    }

    /// Gated reset used by `clear`.
    pub(crate) fn reset(&self) -> bool {
        if self.is_locked() {
            return false;
        }
        self.write().clear();
        true
    }

    /// Ungated replacement used by `load`.
    pub(crate) fn restore(&self, entries: Entries<K, V>) {
        *self.write() = entries;
    }
}
