use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

const VALUE_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value storage backing the stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }
}

/// One file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key).with_extension(VALUE_EXTENSION))
    }

    async fn write_atomic(&self, path: PathBuf, value: &str) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(value.as_bytes()).await?;
            file.sync_all().await?;
        }
        tokio::fs::rename(temp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        self.write_atomic(path, value).await
    }
}

/// Shared in-memory storage. Clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryData>,
}

#[derive(Debug, Default)]
struct MemoryData {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock_entries().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock_entries().insert(key.to_string(), value.to_string());
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds whole values; keep serving it.
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        tokio::task::yield_now().await;
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("read of {key} refused")));
        }
        let value = self.lock_entries().get(key).cloned();
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("write of {key} refused")));
        }
        self.lock_entries().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn file_storage_round_trips_and_reports_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("data"));
        storage.ensure_dirs().unwrap();

        assert_eq!(storage.get("tasks").await.unwrap(), None);
        storage.set("tasks", "[]").await.unwrap();
        assert_eq!(storage.get("tasks").await.unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("data").join("tasks.json").is_file());
        assert!(!dir.path().join("data").join("tasks.tmp").exists());

        storage.set("tasks", "[1]").await.unwrap();
        assert_eq!(storage.get("tasks").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        for key in ["", "../escape", "a/b", "a.b"] {
            assert!(matches!(
                storage.get(key).await,
                Err(StorageError::InvalidKey(_))
            ));
            assert!(matches!(
                storage.set(key, "x").await,
                Err(StorageError::InvalidKey(_))
            ));
        }
        assert!(storage.get("hasCompletedOnboarding").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_storage_surfaces_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());

        // A directory where the value file should be: reads and writes both fail.
        fs::create_dir_all(dir.path().join("tasks.json")).unwrap();
        assert!(matches!(storage.get("tasks").await, Err(StorageError::Io(_))));
        assert!(matches!(storage.set("tasks", "[]").await, Err(StorageError::Io(_))));

        let missing_root = FileStorage::new(dir.path().join("missing"));
        assert!(missing_root.set("tasks", "[]").await.is_err());
    }

    #[tokio::test]
    async fn memory_storage_shares_entries_and_injects_failures() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set("theme", "\"dark\"").await.unwrap();
        assert_eq!(other.get("theme").await.unwrap().as_deref(), Some("\"dark\""));

        storage.set_fail_reads(true);
        assert!(matches!(other.get("theme").await, Err(StorageError::Unavailable(_))));
        assert_eq!(other.raw("theme").as_deref(), Some("\"dark\""));
        storage.set_fail_reads(false);

        storage.set_fail_writes(true);
        assert!(storage.set("theme", "\"light\"").await.is_err());
        assert_eq!(storage.raw("theme").as_deref(), Some("\"dark\""));
    }

    #[tokio::test]
    async fn arc_wrapped_storage_delegates() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
        storage.set("lastVersion", "\"1.0.0\"").await.unwrap();
        assert_eq!(
            storage.get("lastVersion").await.unwrap().as_deref(),
            Some("\"1.0.0\"")
        );
    }
}
