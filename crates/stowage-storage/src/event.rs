//! Storage events and listener types shared by adapters and
//! [`ReactiveStorage`](crate::ReactiveStorage).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::traits::Entries;

/// Names of the storage operations that can be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMethod {
    Add,
    Put,
    Update,
    Delete,
    Set,
    Load,
    Save,
    Clear,
    Destroy,
}

impl StorageMethod {
    /// Every observable method, in declaration order.
    pub const ALL: [StorageMethod; 9] = [
        Self::Add,
        Self::Put,
        Self::Update,
        Self::Delete,
        Self::Set,
        Self::Load,
        Self::Save,
        Self::Clear,
        Self::Destroy,
    ];

    /// Stable lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Put => "put",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Set => "set",
            Self::Load => "load",
            Self::Save => "save",
            Self::Clear => "clear",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for StorageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storage call observed before it is delegated to the adapter.
///
/// Keyed writes carry `key` and `value`; `set` carries the replacement
/// container in `entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Ord, V: Serialize",
    deserialize = "K: Deserialize<'de> + Ord, V: Deserialize<'de>"
))]
pub struct StorageEvent<K, V> {
    pub method: StorageMethod,
    pub key: Option<K>,
    pub value: Option<V>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Entries<K, V>>,
}

impl<K, V> StorageEvent<K, V> {
    /// An event that carries neither key nor value (`save`, `clear`, ...).
    pub fn bare(method: StorageMethod) -> Self {
        Self {
            method,
            key: None,
            value: None,
            entries: None,
        }
    }

    /// An event for a keyed call without a value (`delete`).
    pub fn keyed(method: StorageMethod, key: K) -> Self {
        Self {
            method,
            key: Some(key),
            value: None,
            entries: None,
        }
    }

    /// An event for a keyed write (`add`, `put`, `update`).
    pub fn write(method: StorageMethod, key: K, value: V) -> Self {
        Self {
            method,
            key: Some(key),
            value: Some(value),
            entries: None,
        }
    }

    /// An event for a whole-container replacement (`set`).
    pub fn replace(entries: Entries<K, V>) -> Self {
        Self {
            method: StorageMethod::Set,
            key: None,
            value: None,
            entries: Some(entries),
        }
    }
}

/// A callback registered for one [`StorageMethod`].
///
/// Listeners are compared by pointer identity when removed.
pub type Listener<K, V> = Arc<dyn Fn(&StorageEvent<K, V>) + Send + Sync>;
