//! The adapter contract and the storage contract built on top of it.

use std::collections::BTreeMap;

use crate::error::StorageResult;
use crate::event::{Listener, StorageMethod};
use crate::mode::{Mode, Returns};

/// Bounds every storage key satisfies.
pub trait StorageKey: Ord + Clone + Send + Sync + 'static {}

impl<T: Ord + Clone + Send + Sync + 'static> StorageKey for T {}

/// Bounds every stored value satisfies.
pub trait StorageValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> StorageValue for T {}

/// The value container an adapter owns.
pub type Entries<K, V> = BTreeMap<K, V>;

/// A pluggable persistence component.
///
/// The adapter owns the container and decides how it reaches the backing
/// medium. Every operation except `size` and the lock controls is returned
/// in the adapter's [`Mode`].
///
/// Invariants:
/// - A successful mutation persists before its result resolves.
/// - A failed precondition (key present on `add`, absent on `update` or
///   `delete`, adapter locked) returns `Ok(false)` and changes nothing.
/// - `load` never fails on malformed persisted content; it resets the
///   container to empty instead.
/// - Only backend faults surface as `Err`.
pub trait StorageAdapter<K: StorageKey, V: StorageValue>: Send + Sync {
    /// Whether results are immediate or deferred.
    type Mode: Mode;

    /// Number of entries currently held in memory.
    fn size(&self) -> usize;

    /// Returns `true` while mutations are suppressed.
    fn is_locked(&self) -> bool;

    /// Suppress `add`, `put`, `update`, `delete`, `set` and `clear`.
    fn lock(&self);

    /// Re-enable mutations.
    fn unlock(&self);

    fn has<'a>(&'a self, key: &'a K) -> Returns<'a, Self::Mode, bool>;

    fn get<'a>(&'a self, key: &'a K) -> Returns<'a, Self::Mode, Option<V>>;

    fn keys(&self) -> Returns<'_, Self::Mode, Vec<K>>;

    fn values(&self) -> Returns<'_, Self::Mode, Vec<V>>;

    fn entries(&self) -> Returns<'_, Self::Mode, Vec<(K, V)>>;

    /// Visit every entry in key order.
    fn for_each<'a, F>(&'a self, callback: F) -> Returns<'a, Self::Mode, ()>
    where
        F: FnMut(&V, &K) + Send + 'a;

    /// Insert only if `key` is absent.
    fn add(&self, key: K, value: V) -> Returns<'_, Self::Mode, StorageResult<bool>>;

    /// Insert or overwrite.
    fn put(&self, key: K, value: V) -> Returns<'_, Self::Mode, StorageResult<bool>>;

    /// Overwrite only if `key` is present.
    fn update(&self, key: K, value: V) -> Returns<'_, Self::Mode, StorageResult<bool>>;

    /// Remove only if `key` is present.
    fn delete<'a>(&'a self, key: &'a K) -> Returns<'a, Self::Mode, StorageResult<bool>>;

    /// Replace the whole container.
    fn set(&self, entries: Entries<K, V>) -> Returns<'_, Self::Mode, StorageResult<bool>>;

    /// Repopulate the container from the backend.
    fn load(&self) -> Returns<'_, Self::Mode, StorageResult<()>>;

    /// Write the container to the backend.
    fn save(&self) -> Returns<'_, Self::Mode, StorageResult<()>>;

    /// Empty the container and drop the persisted copy.
    fn clear(&self) -> Returns<'_, Self::Mode, StorageResult<()>>;

    /// Tear the adapter down: `clear`, then release backend storage.
    fn destroy(&self) -> Returns<'_, Self::Mode, StorageResult<()>>;

    /// Optional hook for adapters that emit their own events.
    fn on(&self, _method: StorageMethod, _listener: Listener<K, V>) -> Returns<'_, Self::Mode, ()> {
        <Self::Mode as Mode>::ready(())
    }

    /// Optional hook; `None` removes every listener for `method`.
    fn off(
        &self,
        _method: StorageMethod,
        _listener: Option<Listener<K, V>>,
    ) -> Returns<'_, Self::Mode, ()> {
        <Self::Mode as Mode>::ready(())
    }
}

/// The keyed CRUD contract presented to callers.
///
/// Implemented by [`Storage`](crate::Storage) and
/// [`ReactiveStorage`](crate::ReactiveStorage). Operations that conceptually
/// return the storage itself (`load`, `save`, `clear`, `destroy`,
/// `for_each`) resolve to `&Self` once the adapter call has completed.
pub trait StorageShape<K: StorageKey, V: StorageValue>: Send + Sync {
    type Mode: Mode;

    /// Number of stored entries. Never deferred.
    fn size(&self) -> usize;

    fn has<'a>(&'a self, key: &'a K) -> Returns<'a, Self::Mode, bool>;

    fn get<'a>(&'a self, key: &'a K) -> Returns<'a, Self::Mode, Option<V>>;

    fn keys(&self) -> Returns<'_, Self::Mode, Vec<K>>;

    fn values(&self) -> Returns<'_, Self::Mode, Vec<V>>;

    fn entries(&self) -> Returns<'_, Self::Mode, Vec<(K, V)>>;

    fn for_each<'a, F>(&'a self, callback: F) -> Returns<'a, Self::Mode, &'a Self>
    where
        F: FnMut(&V, &K) + Send + 'a;

    fn add(&self, key: K, value: V) -> Returns<'_, Self::Mode, StorageResult<bool>>;

    fn put(&self, key: K, value: V) -> Returns<'_, Self::Mode, StorageResult<bool>>;

    fn update(&self, key: K, value: V) -> Returns<'_, Self::Mode, StorageResult<bool>>;

    fn delete<'a>(&'a self, key: &'a K) -> Returns<'a, Self::Mode, StorageResult<bool>>;

    fn load(&self) -> Returns<'_, Self::Mode, StorageResult<&Self>>;

    fn save(&self) -> Returns<'_, Self::Mode, StorageResult<&Self>>;

    fn clear(&self) -> Returns<'_, Self::Mode, StorageResult<&Self>>;

    fn destroy(&self) -> Returns<'_, Self::Mode, StorageResult<&Self>>;
}
