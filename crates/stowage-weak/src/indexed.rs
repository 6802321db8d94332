use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{WeakResult, WeakStorageError};
use crate::registry::{self, InstanceId};
use crate::weak::WeakStorage;

/// namespace -> (index -> owning instance). Entries refer to instances by
/// identity only.
static INDEX: Lazy<RwLock<HashMap<String, HashMap<i64, InstanceId>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn lookup(name: &str, index: i64) -> Option<InstanceId> {
    INDEX
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)?
        .get(&index)
        .copied()
}

/// Remove `(name, index)` only while it still points at `id`.
fn unregister(name: &str, index: i64, id: InstanceId) -> bool {
    let mut tables = INDEX.write().unwrap_or_else(PoisonError::into_inner);
    let Some(table) = tables.get_mut(name) else {
        return false;
    };
    if table.get(&index) != Some(&id) {
        return false;
    }
    table.remove(&index);
    true
}

fn numeric_field<T: Serialize>(value: &T, key: &str) -> Option<i64> {
    as_index(serde_json::to_value(value).ok()?.get(key)?)
}

/// Integers, and floats with no fractional part, that fit in `i64`.
fn as_index(field: &Value) -> Option<i64> {
    if let Some(n) = field.as_i64() {
        return Some(n);
    }
    if field.is_u64() {
        return None;
    }
    let f = field.as_f64()?;
    // `i64::MAX as f64` rounds up to 2^63, hence the exclusive upper bound.
    let whole = f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64;
    whole.then_some(f as i64)
}

/// [`WeakStorage`] over a structured value that is also reachable by the
/// numeric value of one of its fields.
///
/// At construction the field named by `key` is read from the value's JSON
/// object form. If it holds a whole number that fits in `i64` (an integer,
/// or a float such as `2.0`) the instance is registered under
/// `(namespace, index)` and can be found with
/// [`get_by_index`](Self::get_by_index) from anywhere in the process. A
/// missing field, a fractional number, or an unsigned value above
/// `i64::MAX` degrades to plain weak storage.
///
/// The registration is removed by [`destroy`](Self::destroy) or when the
/// instance is dropped. It is never moved by later writes: the index is the
/// one captured at construction.
pub struct IndexedWeakStorage<T> {
    storage: WeakStorage<T>,
    key: Option<String>,
    registered: Option<i64>,
}

impl<T> IndexedWeakStorage<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(value: T, key: impl Into<String>, name: impl Into<String>) -> Self {
        let key = key.into();
        let name = name.into();
        let registered = numeric_field(&value, &key);
        let storage = WeakStorage::new(value, name.clone());

        let mut tables = INDEX.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(name).or_default();
        if let Some(index) = registered {
            table.insert(index, storage.id());
            debug!(id = %storage.id(), namespace = %storage.name(), index, "index registered");
        }
        drop(tables);

        Self {
            storage,
            key: registered.map(|_| key),
            registered,
        }
    }

    /// The designated key, if it held an integer at construction.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The index captured at construction.
    pub fn registered_index(&self) -> Option<i64> {
        self.registered
    }

    /// The current integer at the designated key in the stored value.
    pub fn index(&self) -> Option<i64> {
        let key = self.key.as_deref()?;
        numeric_field(&self.storage.value()?, key)
    }

    /// Value of the live instance registered at `(name, index)`.
    pub fn get_by_index(index: i64, name: &str) -> Option<T> {
        registry::get(name, lookup(name, index)?)
    }

    /// [`get_by_index`](Self::get_by_index) within this instance's namespace.
    pub fn find_by_index(&self, index: i64) -> Option<T> {
        Self::get_by_index(index, self.storage.name())
    }

    /// Shallow-merge `partial` onto the object registered at `index` in
    /// this namespace and store the result as this instance's value.
    ///
    /// When nothing is registered at `index` the merge starts from an empty
    /// object. Fields of `partial` win. The registered index is unchanged.
    pub fn update<P: Serialize>(&self, index: i64, partial: &P) -> WeakResult<&Self> {
        let mut merged = match self.find_by_index(index).map(serde_json::to_value) {
            Some(Ok(Value::Object(map))) => map,
            Some(Err(e)) => return Err(serialization(e)),
            _ => Map::new(),
        };
        match serde_json::to_value(partial).map_err(serialization)? {
            Value::Object(fields) => merged.extend(fields),
            other => {
                return Err(WeakStorageError::Serialization(format!(
                    "partial update must be an object, got {other}"
                )))
            }
        }
        let value: T = serde_json::from_value(Value::Object(merged)).map_err(serialization)?;
        self.storage.set(value)?;
        Ok(self)
    }

    pub fn value(&self) -> Option<T> {
        self.storage.value()
    }

    pub fn set(&self, value: T) -> WeakResult<&Self> {
        self.storage.set(value)?;
        Ok(self)
    }

    pub fn clear(&self) -> &Self {
        self.storage.clear();
        self
    }

    pub fn delete(&self) -> &Self {
        self.storage.delete();
        self
    }

    /// Drop the index registration, then clear and remove the association.
    pub fn destroy(&self) -> &Self {
        self.release();
        self.storage.destroy();
        self
    }

    /// Number of registered indexes in `name`.
    pub fn indexed(name: &str) -> usize {
        INDEX
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, HashMap::len)
    }

    /// Returns `true` once any indexed instance has used `name`.
    pub fn has_index_table(name: &str) -> bool {
        INDEX
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

impl<T> IndexedWeakStorage<T> {
    pub fn id(&self) -> InstanceId {
        self.storage.id()
    }

    pub fn name(&self) -> &str {
        self.storage.name()
    }

    pub fn is_live(&self) -> bool {
        self.storage.is_live()
    }

    pub fn as_weak(&self) -> &WeakStorage<T> {
        &self.storage
    }

    fn release(&self) {
        if let Some(index) = self.registered {
            if unregister(self.storage.name(), index, self.storage.id()) {
                debug!(id = %self.storage.id(), namespace = %self.storage.name(), index, "index released");
            }
        }
    }
}

impl<T> Drop for IndexedWeakStorage<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> fmt::Debug for IndexedWeakStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedWeakStorage")
            .field("id", &self.storage.id())
            .field("name", &self.storage.name())
            .field("key", &self.key)
            .field("index", &self.registered)
            .finish()
    }
}

fn serialization(e: serde_json::Error) -> WeakStorageError {
    WeakStorageError::Serialization(e.to_string())
}
