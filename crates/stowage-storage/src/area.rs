//! Backing media: where persisted strings actually live.
//!
//! [`StorageArea`] is the synchronous, web-storage-shaped interface
//! (`get_item` / `set_item` / `remove_item`). [`RemoteBackend`] is its
//! asynchronous counterpart for stores that cannot answer immediately.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::config::FileAreaConfig;
use crate::error::{StorageError, StorageResult};

/// Synchronous string store keyed by namespace.
pub trait StorageArea: Send + Sync {
    /// Read the persisted string, `None` if nothing was written.
    fn get_item(&self, namespace: &str) -> StorageResult<Option<String>>;

    fn set_item(&self, namespace: &str, raw: &str) -> StorageResult<()>;

    /// Remove the persisted string. Removing a missing item is not an error.
    fn remove_item(&self, namespace: &str) -> StorageResult<()>;
}

/// Asynchronous string store keyed by namespace.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn fetch(&self, namespace: &str) -> StorageResult<Option<String>>;

    async fn store(&self, namespace: &str, raw: String) -> StorageResult<()>;

    async fn remove(&self, namespace: &str) -> StorageResult<()>;
}

impl<T: StorageArea + ?Sized> StorageArea for Arc<T> {
    fn get_item(&self, namespace: &str) -> StorageResult<Option<String>> {
        (**self).get_item(namespace)
    }

    fn set_item(&self, namespace: &str, raw: &str) -> StorageResult<()> {
        (**self).set_item(namespace, raw)
    }

    fn remove_item(&self, namespace: &str) -> StorageResult<()> {
        (**self).remove_item(namespace)
    }
}

/// In-process area. Clones share the same items, so several adapters can
/// persist to and load from one area.
#[derive(Clone, Debug, Default)]
pub struct MemoryArea {
    items: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of namespaces with a persisted item.
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageArea for MemoryArea {
    fn get_item(&self, namespace: &str) -> StorageResult<Option<String>> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(namespace).cloned())
    }

    fn set_item(&self, namespace: &str, raw: &str) -> StorageResult<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(namespace.to_string(), raw.to_string());
        Ok(())
    }

    fn remove_item(&self, namespace: &str) -> StorageResult<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(namespace);
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for MemoryArea {
    async fn fetch(&self, namespace: &str) -> StorageResult<Option<String>> {
        self.get_item(namespace)
    }

    async fn store(&self, namespace: &str, raw: String) -> StorageResult<()> {
        self.set_item(namespace, &raw)
    }

    async fn remove(&self, namespace: &str) -> StorageResult<()> {
        self.remove_item(namespace)
    }
}

/// Area persisting each namespace to `<root>/<namespace>.<extension>`.
#[derive(Clone, Debug)]
pub struct FileArea {
    config: FileAreaConfig,
}

impl FileArea {
    /// Open (creating if necessary) the root directory.
    pub fn open(config: FileAreaConfig) -> StorageResult<Self> {
        fs::create_dir_all(&config.root)?;
        debug!(root = %config.root.display(), "file area opened");
        Ok(Self { config })
    }

    pub fn config(&self) -> &FileAreaConfig {
        &self.config
    }

    fn path(&self, namespace: &str) -> StorageResult<PathBuf> {
        validate_namespace(namespace)?;
        let mut file = namespace.to_string();
        if !self.config.extension.is_empty() {
            file.push('.');
            file.push_str(&self.config.extension);
        }
        Ok(self.config.root.join(file))
    }
}

/// A namespace must map to a single file name inside the root.
fn validate_namespace(namespace: &str) -> StorageResult<()> {
    let reason = if namespace.is_empty() {
        "must not be empty"
    } else if namespace == "." || namespace == ".." {
        "must not be a relative path component"
    } else if namespace.contains(['/', '\\', '\0']) {
        "must not contain path separators"
    } else {
        return Ok(());
    };
    Err(StorageError::InvalidNamespace {
        namespace: namespace.to_string(),
        reason: reason.to_string(),
    })
}

impl StorageArea for FileArea {
    fn get_item(&self, namespace: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path(namespace)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, namespace: &str, raw: &str) -> StorageResult<()> {
        let path = self.path(namespace)?;
        // Write a sibling temp file, then rename over the target.
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;
        debug!(namespace, bytes = raw.len(), "file area item written");
        Ok(())
    }

    fn remove_item(&self, namespace: &str) -> StorageResult<()> {
        match fs::remove_file(self.path(namespace)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_area_clones_share_items() {
        let area = MemoryArea::new();
        let other = area.clone();
        area.set_item("ns", "payload").unwrap();
        assert_eq!(other.get_item("ns").unwrap().as_deref(), Some("payload"));
        assert_eq!(other.len(), 1);

        other.remove_item("ns").unwrap();
        assert!(area.is_empty());
        // Removing twice is fine.
        area.remove_item("ns").unwrap();
    }

    #[tokio::test]
    async fn memory_area_as_remote_backend() {
        let area = MemoryArea::new();
        area.store("ns", "x".to_string()).await.unwrap();
        assert_eq!(area.fetch("ns").await.unwrap().as_deref(), Some("x"));
        area.remove("ns").await.unwrap();
        assert!(area.fetch("ns").await.unwrap().is_none());
    }

    #[test]
    fn file_area_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let area = FileArea::open(FileAreaConfig::at(dir.path().join("nested"))).unwrap();

        assert!(area.get_item("prefs").unwrap().is_none());
        area.set_item("prefs", r#"{"a":1}"#).unwrap();
        assert!(dir.path().join("nested/prefs.json").exists());
        assert_eq!(area.get_item("prefs").unwrap().as_deref(), Some(r#"{"a":1}"#));

        area.remove_item("prefs").unwrap();
        assert!(area.get_item("prefs").unwrap().is_none());
        area.remove_item("prefs").unwrap();
    }

    #[test]
    fn file_area_rejects_path_like_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let area = FileArea::open(FileAreaConfig::at(dir.path())).unwrap();
        for bad in ["", "..", "a/b", "a\\b"] {
            let err = area.set_item(bad, "x").unwrap_err();
            assert!(matches!(err, StorageError::InvalidNamespace { .. }), "{bad:?}");
        }
    }

    #[test]
    fn file_area_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileAreaConfig {
            root: dir.path().to_path_buf(),
            extension: String::new(),
        };
        let area = FileArea::open(config).unwrap();
        area.set_item("plain", "v").unwrap();
        assert!(dir.path().join("plain").exists());
    }
}
