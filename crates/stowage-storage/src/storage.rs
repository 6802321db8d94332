use std::fmt;
use std::marker::PhantomData;

use crate::error::StorageResult;
use crate::mode::{Mode, Returns};
use crate::traits::{Entries, StorageAdapter, StorageKey, StorageShape, StorageValue};

/// Keyed storage delegating every operation to one adapter.
///
/// The adapter is fixed at construction and never swapped. The storage
/// holds no entries itself, and its result mode is the adapter's mode, so a
/// storage over an immediate adapter returns plain values while a storage
/// over a deferred adapter returns futures.
pub struct Storage<K, V, A> {
    adapter: A,
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V, A> Storage<K, V, A>
where
    K: StorageKey,
    V: StorageValue,
    A: StorageAdapter<K, V>,
{
    /// Wrap an already constructed adapter.
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            _entries: PhantomData,
        }
    }

    /// Build the adapter from an initial value.
    ///
    /// Backend arguments are captured by `build`, e.g.
    /// `Storage::with_value(entries, |e| MemoryAdapter::new(e))`.
    pub fn with_value<F>(entries: Entries<K, V>, build: F) -> Self
    where
        F: FnOnce(Entries<K, V>) -> A,
    {
        Self::new(build(entries))
    }

    /// Fallible variant of [`with_value`](Self::with_value) for adapters that
    /// load on construction.
    pub fn try_with_value<F>(entries: Entries<K, V>, build: F) -> StorageResult<Self>
    where
        F: FnOnce(Entries<K, V>) -> StorageResult<A>,
    {
        build(entries).map(Self::new)
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Returns `true` if results of this storage must be awaited.
    pub fn is_deferred(&self) -> bool {
        <A::Mode as Mode>::DEFERRED
    }

    pub fn is_locked(&self) -> bool {
        self.adapter.is_locked()
    }

    pub fn lock(&self) -> &Self {
        self.adapter.lock();
        self
    }

    pub fn unlock(&self) -> &Self {
        self.adapter.unlock();
        self
    }

    /// Replace the whole container through the adapter.
    pub fn set(&self, entries: Entries<K, V>) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.adapter.set(entries)
    }

    /// Resolve to `self` once the adapter call has completed.
    fn return_this<'a>(
        &'a self,
        result: Returns<'a, A::Mode, StorageResult<()>>,
    ) -> Returns<'a, A::Mode, StorageResult<&'a Self>> {
        <A::Mode as Mode>::map(result, move |r| r.map(|()| self))
    }
}

impl<K, V, A> StorageShape<K, V> for Storage<K, V, A>
where
    K: StorageKey,
    V: StorageValue,
    A: StorageAdapter<K, V>,
{
    type Mode = A::Mode;

    fn size(&self) -> usize {
        self.adapter.size()
    }

    fn has<'a>(&'a self, key: &'a K) -> Returns<'a, A::Mode, bool> {
        self.adapter.has(key)
    }

    fn get<'a>(&'a self, key: &'a K) -> Returns<'a, A::Mode, Option<V>> {
        self.adapter.get(key)
    }

    fn keys(&self) -> Returns<'_, A::Mode, Vec<K>> {
        self.adapter.keys()
    }

    fn values(&self) -> Returns<'_, A::Mode, Vec<V>> {
        self.adapter.values()
    }

    fn entries(&self) -> Returns<'_, A::Mode, Vec<(K, V)>> {
        self.adapter.entries()
    }

    fn for_each<'a, F>(&'a self, callback: F) -> Returns<'a, A::Mode, &'a Self>
    where
        F: FnMut(&V, &K) + Send + 'a,
    {
        <A::Mode as Mode>::map(self.adapter.for_each(callback), move |()| self)
    }

    fn add(&self, key: K, value: V) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.adapter.add(key, value)
    }

    fn put(&self, key: K, value: V) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.adapter.put(key, value)
    }

    fn update(&self, key: K, value: V) -> Returns<'_, A::Mode, StorageResult<bool>> {
        self.adapter.update(key, value)
    }

    fn delete<'a>(&'a self, key: &'a K) -> Returns<'a, A::Mode, StorageResult<bool>> {
        self.adapter.delete(key)
    }

    fn load(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.return_this(self.adapter.load())
    }

    fn save(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.return_this(self.adapter.save())
    }

    fn clear(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.return_this(self.adapter.clear())
    }

    fn destroy(&self) -> Returns<'_, A::Mode, StorageResult<&Self>> {
        self.return_this(self.adapter.destroy())
    }
}

impl<K, V, A: fmt::Debug> fmt::Debug for Storage<K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("adapter", &self.adapter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{MemoryArea, StorageArea};
    use crate::codec::JsonCodec;
    use crate::memory::MemoryAdapter;
    use crate::persistent::AreaAdapter;
    use crate::remote::RemoteAdapter;
    use proptest::prelude::*;

    fn memory() -> Storage<String, i32, MemoryAdapter<String, i32>> {
        Storage::with_value(Entries::new(), MemoryAdapter::new)
    }

    fn area_storage(
        area: &MemoryArea,
        ns: &str,
    ) -> Storage<String, i32, AreaAdapter<String, i32, MemoryArea>> {
        Storage::try_with_value(Entries::new(), |e| AreaAdapter::json(e, area.clone(), ns)).unwrap()
    }

    // -----------------------------------------------------------------------
    // Immediate mode
    // -----------------------------------------------------------------------

    #[test]
    fn add_then_get() {
        let s = memory();
        assert!(s.add("k".into(), 1).unwrap());
        assert_eq!(s.get(&"k".into()), Some(1));
        assert!(!s.add("k".into(), 2).unwrap());
        assert_eq!(s.get(&"k".into()), Some(1));
        assert!(!s.is_deferred());
    }

    #[test]
    fn update_and_delete_require_presence() {
        let s = memory();
        assert!(!s.update("k".into(), 1).unwrap());
        assert!(!s.has(&"k".into()));
        assert!(!s.delete(&"k".into()).unwrap());

        s.put("k".into(), 1).unwrap();
        assert!(s.update("k".into(), 2).unwrap());
        assert_eq!(s.get(&"k".into()), Some(2));
        assert!(s.delete(&"k".into()).unwrap());
        assert!(!s.has(&"k".into()));
    }

    #[test]
    fn put_is_unconditional_upsert() {
        let s = memory();
        assert!(s.put("k".into(), 1).unwrap());
        assert!(s.put("k".into(), 2).unwrap());
        assert_eq!(s.get(&"k".into()), Some(2));
        assert_eq!(s.size(), 1);
    }

    #[test]
    fn this_returning_operations_chain() {
        let s = memory();
        s.put("a".into(), 1).unwrap();
        s.put("b".into(), 2).unwrap();

        let mut sum = 0i32;
        let same = s.for_each(|v, _| sum += *v);
        assert!(std::ptr::eq(same, &s));
        assert_eq!(sum, 3);

        let cleared = s.save().unwrap().load().unwrap().clear().unwrap();
        assert_eq!(cleared.size(), 0);
    }

    #[test]
    fn lock_makes_mutations_noops() {
        let s = memory();
        s.put("k".into(), 1).unwrap();
        s.lock();
        assert!(s.is_locked());
        assert!(!s.add("n".into(), 1).unwrap());
        assert!(!s.put("k".into(), 9).unwrap());
        assert!(!s.update("k".into(), 9).unwrap());
        assert!(!s.delete(&"k".into()).unwrap());
        assert!(!s.set(Entries::new()).unwrap());
        s.clear().unwrap();
        assert_eq!(s.entries(), vec![("k".to_string(), 1)]);

        s.unlock();
        assert!(s.put("k".into(), 9).unwrap());
        assert_eq!(s.get(&"k".into()), Some(9));
    }

    #[test]
    fn save_then_load_in_new_storage_round_trips() {
        let area = MemoryArea::new();
        let first = area_storage(&area, "round");
        first.put("a".into(), 1).unwrap();
        first.put("b".into(), 2).unwrap();
        first.save().unwrap();

        let second = area_storage(&area, "round");
        second.load().unwrap();
        assert_eq!(second.entries(), first.entries());
    }

    #[test]
    fn corrupted_backend_loads_as_empty() {
        let area = MemoryArea::new();
        let s = area_storage(&area, "corrupt");
        s.put("a".into(), 1).unwrap();

        area.set_item("corrupt", "\u{0}garbage").unwrap();
        let loaded = s.load().unwrap();
        assert_eq!(loaded.size(), 0);
        assert!(loaded.keys().is_empty());
    }

    #[test]
    fn destroy_releases_backend() {
        let area = MemoryArea::new();
        let s = area_storage(&area, "gone");
        s.put("a".into(), 1).unwrap();
        s.destroy().unwrap();
        assert!(area.get_item("gone").unwrap().is_none());
        assert_eq!(s.size(), 0);
    }

    #[test]
    fn debug_includes_adapter() {
        let debug = format!("{:?}", memory());
        assert!(debug.contains("Storage"));
        assert!(debug.contains("MemoryAdapter"));
    }

    // -----------------------------------------------------------------------
    // Deferred mode
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn deferred_storage_returns_futures() {
        let area = MemoryArea::new();
        let adapter = RemoteAdapter::<String, i32, _>::open(Entries::new(), area.clone(), "remote", JsonCodec)
            .await
            .unwrap();
        let s: Storage<String, i32, _> = Storage::new(adapter);
        assert!(s.is_deferred());

        assert!(s.add("a".into(), 1).await.unwrap());
        assert!(!s.add("a".into(), 2).await.unwrap());
        assert_eq!(s.get(&"a".into()).await, Some(1));
        assert_eq!(s.size(), 1);

        let this = s.save().await.unwrap();
        assert!(std::ptr::eq(this, &s));

        let mut seen = Vec::new();
        s.for_each(|v, k| seen.push((k.clone(), *v))).await;
        assert_eq!(seen, vec![("a".to_string(), 1)]);

        let reopened: Storage<String, i32, _> = Storage::new(
            RemoteAdapter::<String, i32, _>::open(Entries::new(), area.clone(), "remote", JsonCodec)
                .await
                .unwrap(),
        );
        assert_eq!(reopened.values().await, vec![1]);

        s.destroy().await.unwrap();
        assert!(area.get_item("remote").unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, i32),
        Put(u8, i32),
        Update(u8, i32),
        Delete(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<i32>()).prop_map(|(k, v)| Op::Add(k % 8, v)),
            (any::<u8>(), any::<i32>()).prop_map(|(k, v)| Op::Put(k % 8, v)),
            (any::<u8>(), any::<i32>()).prop_map(|(k, v)| Op::Update(k % 8, v)),
            any::<u8>().prop_map(|k| Op::Delete(k % 8)),
        ]
    }

    proptest! {
        #[test]
        fn add_succeeds_only_for_absent_keys(key in "[a-z]{1,8}", v1 in any::<i32>(), v2 in any::<i32>()) {
            let s = memory();
            prop_assert!(s.add(key.clone(), v1).unwrap());
            prop_assert_eq!(s.get(&key), Some(v1));
            prop_assert!(!s.add(key.clone(), v2).unwrap());
            prop_assert_eq!(s.get(&key), Some(v1));
        }

        #[test]
        fn operations_match_a_model(ops in proptest::collection::vec(op(), 0..64)) {
            let s: Storage<u8, i32, _> = Storage::new(MemoryAdapter::empty());
            let mut model = Entries::new();
            for op in ops {
                match op {
                    Op::Add(k, v) => {
                        let expected = !model.contains_key(&k);
                        if expected { model.insert(k, v); }
                        prop_assert_eq!(s.add(k, v).unwrap(), expected);
                    }
                    Op::Put(k, v) => {
                        model.insert(k, v);
                        prop_assert!(s.put(k, v).unwrap());
                    }
                    Op::Update(k, v) => {
                        let expected = model.contains_key(&k);
                        if expected { model.insert(k, v); }
                        prop_assert_eq!(s.update(k, v).unwrap(), expected);
                    }
                    Op::Delete(k) => {
                        let expected = model.remove(&k).is_some();
                        prop_assert_eq!(s.delete(&k).unwrap(), expected);
                    }
                }
                for k in 0..8u8 {
                    prop_assert_eq!(s.has(&k), model.contains_key(&k));
                }
            }
            prop_assert_eq!(s.size(), model.len());
        }

        #[test]
        fn persisted_round_trip(entries in proptest::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..16)) {
            let area = MemoryArea::new();
            let first = area_storage(&area, "prop");
            first.set(entries.clone()).unwrap();
            first.save().unwrap();

            let second = area_storage(&area, "prop");
            second.load().unwrap();
            let loaded: Entries<String, i32> = second.entries().into_iter().collect();
            prop_assert_eq!(loaded, entries);
        }
    }
}
