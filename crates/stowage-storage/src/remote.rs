use std::fmt;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::area::RemoteBackend;
use crate::codec::{Codec, JsonCodec};
use crate::container::Container;
use crate::error::StorageResult;
use crate::mode::Deferred;
use crate::traits::{Entries, StorageAdapter, StorageKey, StorageValue};

/// Deferred adapter persisting the container through an async
/// [`RemoteBackend`].
///
/// The container is held in memory; only `load`, `save` and successful
/// mutations reach the backend. Reads still resolve through futures so the
/// adapter presents a uniformly deferred surface.
pub struct RemoteAdapter<K, V, B, C = JsonCodec> {
    container: Container<K, V>,
    backend: B,
    namespace: String,
    codec: C,
}

impl<K, V, B, C> RemoteAdapter<K, V, B, C>
where
    K: StorageKey,
    V: StorageValue,
    B: RemoteBackend,
    C: Codec<Entries<K, V>>,
{
    /// Create an adapter without contacting the backend.
    pub fn new(entries: Entries<K, V>, backend: B, namespace: impl Into<String>, codec: C) -> Self {
        Self {
            container: Container::new(entries),
            backend,
            namespace: namespace.into(),
            codec,
        }
    }

    /// Create an adapter and load any persisted state.
    pub async fn open(
        entries: Entries<K, V>,
        backend: B,
        namespace: impl Into<String>,
        codec: C,
    ) -> StorageResult<Self> {
        let adapter = Self::new(entries, backend, namespace, codec);
        adapter.reload().await?;
        Ok(adapter)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn reload(&self) -> StorageResult<()> {
        let Some(raw) = self.backend.fetch(&self.namespace).await? else {
            return Ok(());
        };
        match self.codec.decode(&raw) {
            Ok(entries) => {
                debug!(namespace = %self.namespace, size = entries.len(), "remote storage loaded");
                self.container.restore(entries);
            }
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "corrupt remote storage; resetting");
                self.container.restore(Entries::new());
            }
        }
        Ok(())
    }

    async fn persist(&self) -> StorageResult<()> {
        let raw = self.codec.encode(&self.container.snapshot())?;
        let bytes = raw.len();
        self.backend.store(&self.namespace, raw).await?;
        debug!(namespace = %self.namespace, bytes, "remote storage saved");
        Ok(())
    }

    async fn persist_if(&self, changed: bool) -> StorageResult<bool> {
        if changed {
            self.persist().await?;
        }
        Ok(changed)
    }
}

impl<K, V, B, C> StorageAdapter<K, V> for RemoteAdapter<K, V, B, C>
where
    K: StorageKey,
    V: StorageValue,
    B: RemoteBackend,
    C: Codec<Entries<K, V>>,
{
    type Mode = Deferred;

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

    fn has<'a>(&'a self, key: &'a K) -> BoxFuture<'a, bool> {
        async move { self.container.has(key) }.boxed()
    }

    fn get<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Option<V>> {
        async move { self.container.get(key) }.boxed()
    }

    fn keys(&self) -> BoxFuture<'_, Vec<K>> {
        async move { self.container.keys() }.boxed()
    }

    fn values(&self) -> BoxFuture<'_, Vec<V>> {
        async move { self.container.values() }.boxed()
    }

    fn entries(&self) -> BoxFuture<'_, Vec<(K, V)>> {
        async move { self.container.entries() }.boxed()
    }

    fn for_each<'a, F>(&'a self, mut callback: F) -> BoxFuture<'a, ()>
    where
        F: FnMut(&V, &K) + Send + 'a,
    {
        async move {
            for (key, value) in self.container.entries() {
                callback(&value, &key);
            }
        }
        .boxed()
    }

    fn add(&self, key: K, value: V) -> BoxFuture<'_, StorageResult<bool>> {
        async move { self.persist_if(self.container.add(key, value)).await }.boxed()
    }

    fn put(&self, key: K, value: V) -> BoxFuture<'_, StorageResult<bool>> {
        async move { self.persist_if(self.container.put(key, value)).await }.boxed()
    }

    fn update(&self, key: K, value: V) -> BoxFuture<'_, StorageResult<bool>> {
        async move { self.persist_if(self.container.update(key, value)).await }.boxed()
    }

    fn delete<'a>(&'a self, key: &'a K) -> BoxFuture<'a, StorageResult<bool>> {
        async move { self.persist_if(self.container.delete(key)).await }.boxed()
    }

    fn set(&self, entries: Entries<K, V>) -> BoxFuture<'_, StorageResult<bool>> {
        async move { self.persist_if(self.container.replace(entries)).await }.boxed()
    }

    fn load(&self) -> BoxFuture<'_, StorageResult<()>> {
        self.reload().boxed()
    }

    fn save(&self) -> BoxFuture<'_, StorageResult<()>> {
        self.persist().boxed()
    }

    fn clear(&self) -> BoxFuture<'_, StorageResult<()>> {
        async move {
            if self.container.reset() {
                self.backend.remove(&self.namespace).await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn destroy(&self) -> BoxFuture<'_, StorageResult<()>> {
        self.clear()
    }
}

impl<K, V, B, C> fmt::Debug for RemoteAdapter<K, V, B, C>
where
    K: StorageKey,
    V: StorageValue,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteAdapter")
            .field("namespace", &self.namespace)
            .field("size", &self.container.len())
            .field("locked", &self.container.is_locked())
            .finish()
    }
}
