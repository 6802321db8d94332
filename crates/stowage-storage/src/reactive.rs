use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::trace;

use crate::config::ReactiveConfig;
use crate::error::StorageResult;
use crate::event::{Listener, StorageEvent, StorageMethod};
use crate::mode::{Mode, Returns};
use crate::storage::Storage;
use crate::traits::{Entries, StorageAdapter, StorageKey, StorageShape, StorageValue};

/// A broadcast receiver of storage events.
pub type EventStream<K, V> = broadcast::Receiver<StorageEvent<K, V>>;

/// [`Storage`] that announces each call before delegating it.
///
/// Events go to two places: broadcast subscribers obtained from
/// [`subscribe`](Self::subscribe), and per-method listeners registered with
/// [`on`](Self::on). An event is emitted when the call is made, whether or
/// not the adapter then accepts it.
pub struct ReactiveStorage<K, V, A> {
    storage: Storage<K, V, A>,
    sender: broadcast::Sender<StorageEvent<K, V>>,
    listeners: RwLock<HashMap<StorageMethod, Vec<Listener<K, V>>>>,
}

impl<K, V, A> ReactiveStorage<K, V, A>
where
    K: StorageKey,
    V: StorageValue,
    A: StorageAdapter<K, V>,
{
    pub fn new(adapter: A) -> Self {
        Self::from_storage(Storage::new(adapter), ReactiveConfig::default())
    }

    pub fn with_config(adapter: A, config: ReactiveConfig) -> Self {
        Self::from_storage(Storage::new(adapter), config)
    }

    pub fn from_storage(storage: Storage<K, V, A>, config: ReactiveConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            storage,
            sender,
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped storage. Calls made on it directly are not announced.
    pub fn storage(&self) -> &Storage<K, V, A> {
        &self.storage
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> EventStream<K, V> {
        self.sender.subscribe()
    }

    /// Number of listeners registered for `method`.
    pub fn listener_count(&self, method: StorageMethod) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&method)
            .map_or(0, Vec::len)
    }

    /// Register `listener` for `method` and forward it to the adapter hook.
    pub fn on(&self, method: StorageMethod, listener: Listener<K, V>) -> Returns<'_, A::Mode, &Self> {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(method)
            .or_default()
            .push(Arc::clone(&listener));
        <A::Mode as Mode>::map(self.storage.adapter().on(method, listener), move |()| self)
    }

    /// Remove one listener, or every listener for `method` when `listener`
    /// is `None`, and forward the removal to the adapter hook.
    pub fn off(
        &self,
        method: StorageMethod,
        listener: Option<&Listener<K, V>>,
    ) -> Returns<'_, A::Mode, &Self> {
        {
            let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
            match listener {
                Some(target) => {
                    if let Some(registered) = listeners.get_mut(&method) {
                        registered.retain(|l| !Arc::ptr_eq(l, target));
                    }
                }
                None => {
                    listeners.remove(&method);
                }
            }
        }
        let hook = self.storage.adapter().off(method, listener.cloned());
        <A::Mode as Mode>::map(hook, move |()| self)
    }

    pub fn is_locked(&self) -> bool {
        self.storage.is_locked()
    }

    pub fn lock(&self) -> &Self {
        self.storage.lock();
        self
    }

    pub fn unlock(&self) -> &Self {
        self.storage.unlock();
        self
    }

    /// Replace the whole container.
    pub fn set(&self, entries: Entries<K, V>) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.emit(StorageEvent::replace(entries.clone()));
        self.storage.set(entries)
    }

    fn emit(&self, event: StorageEvent<K, V>) {
        trace!(method = %event.method, "storage event");
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.method)
            .cloned()
            .unwrap_or_default();
        for listener in &listeners {
            listener(&event);
        }
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }

    fn forward<'a>(
        &'a self,
        result: Returns<'a, A::Mode, StorageResult<&'a Storage<K, V, A>>>,
    ) -> Returns<'a, A::Mode, StorageResult<&'a Self>> {
        <A::Mode as Mode>::map(result, move |r| r.map(|_| self))
    }
}

impl<K, V, A> StorageShape<K, V> for ReactiveStorage<K, V, A>
where
    K: StorageKey,
    V: StorageValue,
    A: StorageAdapter<K, V>,
{
    type Mode = A::Mode;

    fn size(&self) -> usize {
        self.storage.size()
    }

    fn has<'a>(&'a self, key: &'a K) -> Returns<'a, A::Mode, bool> {
        self.storage.has(key)
    }

    fn get<'a>(&'a self, key: &'a K) -> Returns<'a, A::Mode, Option<V>> {
        self.storage.get(key)
    }

    fn keys(&self) -> Returns<'_, A::Mode, Vec<K>> {
        self.storage.keys()
    }

    fn values(&self) -> Returns<'_, A::Mode, Vec<V>> {
        self.storage.values()
    }

    fn entries(&self) -> Returns<'_, A::Mode, Vec<(K, V)>> {
        self.storage.entries()
    }

    fn for_each<'a, F>(&'a self, callback: F) -> Returns<'a, A::Mode, &'a Self>
    where
        F: FnMut(&V, &K) + Send + 'a,
    {
        <A::Mode as Mode>::map(self.storage.for_each(callback), move |_| self)
    }

    fn add(&self, key: K, value: V) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.emit(StorageEvent::write(StorageMethod::Add, key.clone(), value.clone()));
        self.storage.add(key, value)
    }

    fn put(&self, key: K, value: V) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.emit(StorageEvent::write(StorageMethod::Put, key.clone(), value.clone()));
        self.storage.put(key, value)
    }

    fn update(&self, key: K, value: V) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.emit(StorageEvent::write(StorageMethod::Update, key.clone(), value.clone()));
        self.storage.update(key, value)
    }

    fn delete<'a>(&'a self, key: &'a K) -> Returns<'a, A::Mode, StorageResult<bool>> {
        self.emit(StorageEvent::keyed(StorageMethod::Delete, key.clone()));
        self.storage.delete(key)
    }

    fn load(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.emit(StorageEvent::bare(StorageMethod::Load));
        self.forward(self.storage.load())
    }

    fn save(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.emit(StorageEvent::bare(StorageMethod::Save));
        self.forward(self.storage.save())
    }

    fn clear(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.emit(StorageEvent::bare(StorageMethod::Clear));
        self.forward(self.storage.clear())
    }

    fn destroy(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.emit(StorageEvent::bare(StorageMethod::Destroy));
        self.forward(self.storage.destroy())
    }
}

impl<K, V, A: fmt::Debug> fmt::Debug for ReactiveStorage<K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveStorage")
            .field("storage", &self.storage)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}
