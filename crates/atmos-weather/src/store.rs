//! Persisted key/value state that survives between runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use atmos_core::StorageError;
use parking_lot::Mutex;

/// String key/value storage with explicit removal.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    fn clear(&mut self) -> Result<(), StorageError>;
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let data = match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StorageError::Corruption(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        tracing::debug!("Opened state file {} ({} keys)", path.display(), data.len());
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Delete the backing file, whatever its contents.
    pub fn destroy(path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        let write_err = |message: String| StorageError::WriteFailed {
            path: self.path.display().to_string(),
            message,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&self.data).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| write_err(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.data.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.data.clear();
        self.persist()
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data.lock().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.data.lock().remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.data.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("lastCity"), None);

        store.set("lastCity", "Tokyo, JP").unwrap();
        store.set("refreshCount", "2").unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("lastCity").as_deref(), Some("Tokyo, JP"));
        assert_eq!(reopened.get("refreshCount").as_deref(), Some("2"));
    }

    #[test]
    fn test_file_store_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        assert_eq!(FileStore::open(&path).unwrap().get("a"), None);

        store.clear().unwrap();
        assert_eq!(FileStore::open(&path).unwrap().get("b"), None);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Corruption(_)));

        FileStore::destroy(&path).unwrap();
        assert!(FileStore::open(&path).unwrap().get("anything").is_none());
        // Destroying twice is fine
        FileStore::destroy(&path).unwrap();
    }

    #[test]
    fn test_memory_store_clones_share_data() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        handle.set("isLocationBased", "true").unwrap();
        assert_eq!(store.get("isLocationBased").as_deref(), Some("true"));
        assert_eq!(store.snapshot().len(), 1);
    }
}
