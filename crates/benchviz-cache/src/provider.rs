//! Key/value storage backends for the chart-data cache.

use crate::keys::file_name_for_key;
use benchviz_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// String key/value storage, shaped like browser web storage.
///
/// Calls are synchronous. Any call may fail (quota, I/O, corrupt data); the
/// cache layer recovers from every failure.
pub trait CacheStore: Send + Sync {
    /// Read the value for `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// List every key in the store.
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory store with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(Error::Storage(format!(
                    "quota of {} bytes exceeded",
                    quota
                )));
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// On-disk record; the original key is kept because file names are hashed.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    key: String,
    value: String,
}

/// Filesystem-backed store: one JSON record file per key.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root_dir: PathBuf,
}

impl FilesystemStore {
    pub fn new(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root_dir.join(file_name_for_key(key))
    }

    fn read_record(path: &std::path::Path) -> Result<StoredRecord> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read cache: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Corrupt cache record {}: {}", path.display(), e)))
    }
}

impl CacheStore for FilesystemStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let record = Self::read_record(&path)?;
        // A hash collision would surface as a different stored key.
        if record.key != key {
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root_dir)
            .map_err(|e| Error::Storage(format!("Failed to create cache dir: {}", e)))?;

        let record = StoredRecord {
            key: key.to_string(),
            value: value.to_string(),
        };
        let content = serde_json::to_string(&record)
            .map_err(|e| Error::Storage(format!("Failed to encode cache record: {}", e)))?;

        // Write to a sibling file and rename so readers never see half a record.
        let path = self.key_path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| Error::Storage(format!("Failed to write cache: {}", e)))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::Storage(format!("Failed to write cache: {}", e)));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to delete cache: {}", e)))?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.root_dir.exists() {
            return Ok(vec![]);
        }

        let read_dir = std::fs::read_dir(&self.root_dir)
            .map_err(|e| Error::Storage(format!("Failed to read cache dir: {}", e)))?;

        let mut keys = vec![];
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => keys.push(record.key),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable cache record"),
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn CacheStore) {
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("3".to_string()));

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        store.remove("a").unwrap();
        store.remove("missing").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_filesystem_store() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&FilesystemStore::new(dir.path().join("cache")));
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();
        let err = store.set("other", "123456").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        // Replacing an existing key only counts the new value.
        store.set("k", "123456789").unwrap();
    }

    #[test]
    fn test_filesystem_store_keeps_original_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());
        store.set("chart-data-cache-/benchmarks/a.json", "{}").unwrap();
        assert_eq!(
            store.keys().unwrap(),
            vec!["chart-data-cache-/benchmarks/a.json".to_string()]
        );
    }

    #[test]
    fn test_filesystem_store_skips_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());
        store.set("good", "1").unwrap();
        std::fs::write(dir.path().join("garbage.json"), "not json").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["good".to_string()]);
    }

    #[test]
    fn test_filesystem_store_failed_rename_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().to_path_buf());

        // A directory at the record path makes the rename fail.
        let path = store.key_path("chart-data-cache-/a.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        assert!(store.set("chart-data-cache-/a.json", "{}").is_err());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_filesystem_store_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().join("never-created"));
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(store.get("x").unwrap(), None);
    }
}
