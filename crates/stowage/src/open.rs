//! Shorthand constructors for the common storage setups.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use stowage_storage::{
    AreaAdapter, Entries, FileArea, FileAreaConfig, MemoryAdapter, ReactiveConfig,
    ReactiveStorage, Storage, StorageKey, StorageValue,
};

use crate::error::StowageResult;

pub type MemoryStorage<K, V> = Storage<K, V, MemoryAdapter<K, V>>;

pub type FileStorage<K, V> = Storage<K, V, AreaAdapter<K, V, FileArea>>;

pub type ReactiveMemoryStorage<K, V> = ReactiveStorage<K, V, MemoryAdapter<K, V>>;

/// In-memory storage seeded with `entries`.
pub fn memory<K: StorageKey, V: StorageValue>(entries: Entries<K, V>) -> MemoryStorage<K, V> {
    Storage::with_value(entries, MemoryAdapter::new)
}

/// JSON-encoded storage kept in `<root>/<namespace>.<extension>`.
///
/// Persisted content replaces `entries` when the file already exists.
pub fn file<K, V>(
    entries: Entries<K, V>,
    config: FileAreaConfig,
    namespace: &str,
) -> StowageResult<FileStorage<K, V>>
where
    K: StorageKey + Serialize + DeserializeOwned,
    V: StorageValue + Serialize + DeserializeOwned,
{
    let area = FileArea::open(config)?;
    debug!(root = %area.config().root.display(), namespace, "opening file storage");
    let storage = Storage::try_with_value(entries, |e| AreaAdapter::json(e, area, namespace))?;
    Ok(storage)
}

/// In-memory storage that announces every call.
pub fn reactive_memory<K: StorageKey, V: StorageValue>(
    entries: Entries<K, V>,
    config: ReactiveConfig,
) -> ReactiveMemoryStorage<K, V> {
    ReactiveStorage::with_config(MemoryAdapter::new(entries), config)
}
