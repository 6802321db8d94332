//! The process-wide association registry behind [`WeakStorage`].
//!
//! Layout: namespace name -> (instance id -> boxed slot). A namespace's
//! table is created the first time the name is used and lives for the rest
//! of the process. Slots are owned by the registry, keyed by identity only,
//! so holding a slot never keeps its instance alive; the instance removes
//! its own slot when it is dropped.
//!
//! [`WeakStorage`]: crate::WeakStorage

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;

/// Process-unique identity of a weak storage instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A slot holds `Option<T>`; `None` is the cleared sentinel.
type Slot = Box<dyn Any + Send + Sync>;

type Tables = HashMap<String, HashMap<InstanceId, Slot>>;

static ASSOCIATIONS: Lazy<RwLock<Tables>> = Lazy::new(|| RwLock::new(HashMap::new()));

fn read<R>(f: impl FnOnce(&Tables) -> R) -> R {
    f(&ASSOCIATIONS.read().unwrap_or_else(PoisonError::into_inner))
}

fn write<R>(f: impl FnOnce(&mut Tables) -> R) -> R {
    f(&mut ASSOCIATIONS.write().unwrap_or_else(PoisonError::into_inner))
}

/// Insert or overwrite the slot for `id`, creating the namespace's table on
/// first use.
pub(crate) fn insert<T: Send + Sync + 'static>(name: &str, id: InstanceId, value: Option<T>) {
    write(|tables| {
        tables
            .entry(name.to_string())
            .or_default()
            .insert(id, Box::new(value));
    });
}

/// Overwrite the slot for `id` only if it exists. Returns `true` on write.
pub(crate) fn replace<T: Send + Sync + 'static>(name: &str, id: InstanceId, value: Option<T>) -> bool {
    write(|tables| match tables.get_mut(name).and_then(|t| t.get_mut(&id)) {
        Some(slot) => {
            *slot = Box::new(value);
            true
        }
        None => false,
    })
}

/// Clone the value in `id`'s slot. `None` if there is no slot, the slot was
/// cleared, or it holds a different type.
pub(crate) fn get<T: Clone + 'static>(name: &str, id: InstanceId) -> Option<T> {
    read(|tables| {
        tables
            .get(name)?
            .get(&id)?
            .downcast_ref::<Option<T>>()?
            .clone()
    })
}

pub(crate) fn contains(name: &str, id: InstanceId) -> bool {
    read(|tables| tables.get(name).is_some_and(|t| t.contains_key(&id)))
}

pub(crate) fn remove(name: &str, id: InstanceId) -> bool {
    write(|tables| {
        tables
            .get_mut(name)
            .is_some_and(|t| t.remove(&id).is_some())
    })
}

pub(crate) fn len(name: &str) -> usize {
    read(|tables| tables.get(name).map_or(0, HashMap::len))
}

pub(crate) fn namespaces() -> Vec<String> {
    let mut names: Vec<String> = read(|tables| tables.keys().cloned().collect());
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        assert!(b > a);
        assert_eq!(a.to_string(), format!("#{}", a.as_u64()));
    }

    #[test]
    fn slot_lifecycle() {
        let ns = "registry::slot_lifecycle";
        let id = InstanceId::next();
        assert!(!contains(ns, id));

        insert(ns, id, Some(5u32));
        assert_eq!(get::<u32>(ns, id), Some(5));
        // Wrong type reads as absent.
        assert_eq!(get::<i64>(ns, id), None);

        assert!(replace::<u32>(ns, id, None));
        assert!(contains(ns, id));
        assert_eq!(get::<u32>(ns, id), None);

        assert!(remove(ns, id));
        assert!(!remove(ns, id));
        assert!(!replace(ns, id, Some(1u32)));
        assert_eq!(len(ns), 0);
        // The table itself outlives its last slot.
        assert!(namespaces().contains(&ns.to_string()));
    }

    #[test]
    fn insert_creates_namespace_once() {
        let ns = "registry::lazy";
        assert!(!namespaces().contains(&ns.to_string()));
        insert(ns, InstanceId::next(), Some(1u8));
        insert(ns, InstanceId::next(), Some(2u8));
        assert_eq!(namespaces().iter().filter(|n| *n == ns).count(), 1);
        assert_eq!(len(ns), 2);
    }
}
