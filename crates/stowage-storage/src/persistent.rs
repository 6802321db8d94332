use std::fmt;

use tracing::{debug, warn};

use crate::area::StorageArea;
use crate::codec::{Codec, JsonCodec};
use crate::container::Container;
use crate::error::StorageResult;
use crate::mode::Immediate;
use crate::traits::{Entries, StorageAdapter, StorageKey, StorageValue};

/// Synchronous adapter persisting the whole container as one string under
/// `namespace` in a [`StorageArea`].
///
/// Every successful mutation re-encodes and writes the container. Loading
/// malformed content resets the container to empty.
pub struct AreaAdapter<K, V, A, C = JsonCodec> {
    container: Container<K, V>,
    area: A,
    namespace: String,
    codec: C,
}

impl<K, V, A> AreaAdapter<K, V, A, JsonCodec>
where
    K: StorageKey,
    V: StorageValue,
    A: StorageArea,
    JsonCodec: Codec<Entries<K, V>>,
{
    /// Create an adapter with the JSON codec and load any persisted state.
    pub fn json(entries: Entries<K, V>, area: A, namespace: impl Into<String>) -> StorageResult<Self> {
        Self::new(entries, area, namespace, JsonCodec)
    }
}

impl<K, V, A, C> AreaAdapter<K, V, A, C>
where
    K: StorageKey,
    V: StorageValue,
    A: StorageArea,
    C: Codec<Entries<K, V>>,
{
    /// Create an adapter and load any persisted state.
    ///
    /// `entries` is kept when the area holds nothing for `namespace`.
    pub fn new(
        entries: Entries<K, V>,
        area: A,
        namespace: impl Into<String>,
        codec: C,
    ) -> StorageResult<Self> {
        let adapter = Self {
            container: Container::new(entries),
            area,
            namespace: namespace.into(),
            codec,
        };
        adapter.reload()?;
        Ok(adapter)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn area(&self) -> &A {
        &self.area
    }

    fn reload(&self) -> StorageResult<()> {
        let Some(raw) = self.area.get_item(&self.namespace)? else {
            return Ok(());
        };
        match self.codec.decode(&raw) {
            Ok(entries) => {
                debug!(namespace = %self.namespace, size = entries.len(), "storage loaded");
                self.container.restore(entries);
            }
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "corrupt persisted storage; resetting");
                self.container.restore(Entries::new());
            }
        }
        Ok(())
    }

    fn persist(&self) -> StorageResult<()> {
        let raw = self.codec.encode(&self.container.snapshot())?;
        self.area.set_item(&self.namespace, &raw)?;
        debug!(namespace = %self.namespace, bytes = raw.len(), "storage saved");
        Ok(())
    }

    fn persist_if(&self, changed: bool) -> StorageResult<bool> {
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }
}

impl<K, V, A, C> StorageAdapter<K, V> for AreaAdapter<K, V, A, C>
where
    K: StorageKey,
    V: StorageValue,
    A: StorageArea,
    C: Codec<Entries<K, V>>,
{
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
        self.persist_if(self.container.add(key, value))
    }

    fn put(&self, key: K, value: V) -> StorageResult<bool> {
        self.persist_if(self.container.put(key, value))
    }

    fn update(&self, key: K, value: V) -> StorageResult<bool> {
        self.persist_if(self.container.update(key, value))
    }

    fn delete(&self, key: &K) -> StorageResult<bool> {
        self.persist_if(self.container.delete(key))
    }

    fn set(&self, entries: Entries<K, V>) -> StorageResult<bool> {
        self.persist_if(self.container.replace(entries))
    }

    fn load(&self) -> StorageResult<()> {
        self.reload()
    }

    fn save(&self) -> StorageResult<()> {
        self.persist()
    }

    fn clear(&self) -> StorageResult<()> {
        if self.container.reset() {
            self.area.remove_item(&self.namespace)?;
        }
        Ok(())
    }

    fn destroy(&self) -> StorageResult<()> {
        self.clear()
    }
}

impl<K, V, A, C> fmt::Debug for AreaAdapter<K, V, A, C>
where
    K: StorageKey,
    V: StorageValue,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaAdapter")
            .field("namespace", &self.namespace)
            .field("size", &self.container.len())
            .field("locked", &self.container.is_locked())
            .finish()
    }
}
