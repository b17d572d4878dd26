//! Key-value store implementations.
//!
//! `FsKeyValueStore` is the persistent, always-available source of truth:
//! one file per key with atomic tmp-file + rename writes behind an exclusive
//! lock, so each key is logically atomic. `MemoryKeyValueStore` backs tests
//! and hosts without any disk.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use sonora_core::error::{Result, SonoraError};
use sonora_core::store::KeyValueStore;

/// Persistent key-value store: one file per key under a directory.
pub struct FsKeyValueStore {
    dir: PathBuf,
}

impl FsKeyValueStore {
    /// Opens (and creates if missing) a store rooted at `dir`.
    pub async fn new(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            SonoraError::io(format!(
                "failed to create key-value directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    /// Maps a key to its entry file, rejecting keys that would leave the
    /// store directory.
    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.starts_with('.')
        {
            return Err(SonoraError::io(format!("invalid key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl KeyValueStore for FsKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SonoraError::io(format!(
                "failed to read key '{key}': {e}"
            ))),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(key)?;
        let value = value.to_vec();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || write_atomic(&path, &value))
            .await
            .map_err(|e| SonoraError::io(format!("write task for key '{key}' failed: {e}")))?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SonoraError::io(format!(
                "failed to remove key '{key}': {e}"
            ))),
        }
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            SonoraError::io(format!(
                "failed to list key-value directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SonoraError::io(format!("failed to walk key-value directory: {e}")))?
        {
            let path = entry.path();
            if path.is_file() {
                tokio::fs::remove_file(&path).await.map_err(|e| {
                    SonoraError::io(format!(
                        "failed to remove entry '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

/// Writes an entry atomically: tmp file in the same directory, fsync, then
/// rename over the destination, all under an exclusive lock.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let _lock = EntryLock::acquire(path)?;

    let parent = path
        .parent()
        .ok_or_else(|| SonoraError::io("entry path has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| SonoraError::io("entry path has no file name"))?;

    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| SonoraError::io(format!("failed to create tmp entry: {e}")))?;
    tmp_file
        .write_all(bytes)
        .map_err(|e| SonoraError::io(format!("failed to write tmp entry: {e}")))?;
    tmp_file
        .sync_all()
        .map_err(|e| SonoraError::io(format!("failed to sync tmp entry: {e}")))?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)
        .map_err(|e| SonoraError::io(format!("failed to commit entry: {e}")))?;

    Ok(())
}

/// An exclusive lock on one entry, released when dropped.
struct EntryLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl EntryLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| SonoraError::io(format!("failed to open lock file: {e}")))?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| SonoraError::io(format!("failed to acquire entry lock: {e}")))?;
        }

        Ok(EntryLock { file, lock_path })
    }
}

impl Drop for EntryLock {
    fn drop(&mut self) {
        // Unlocking is implicit when the handle drops; removing the lock
        // file is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// In-memory key-value store.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FsKeyValueStore::new(dir.path().to_path_buf()).await.unwrap();

        store.set("users", b"[]").await.unwrap();
        assert_eq!(store.get("users").await.unwrap(), Some(b"[]".to_vec()));
    }

    #[tokio::test]
    async fn missing_key_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FsKeyValueStore::new(dir.path().to_path_buf()).await.unwrap();

        assert_eq!(store.get("userToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_and_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let store = FsKeyValueStore::new(dir.path().to_path_buf()).await.unwrap();

        store.set("users", b"first").await.unwrap();
        store.set("users", b"second").await.unwrap();
        assert_eq!(store.get("users").await.unwrap(), Some(b"second".to_vec()));
        assert!(!dir.path().join(".users.tmp").exists());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FsKeyValueStore::new(dir.path().to_path_buf()).await.unwrap();

        store.set("userToken", b"u_1").await.unwrap();
        store.remove("userToken").await.unwrap();
        store.remove("userToken").await.unwrap();
        assert_eq!(store.get("userToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let dir = TempDir::new().unwrap();
        let store = FsKeyValueStore::new(dir.path().to_path_buf()).await.unwrap();

        store.set("users", b"[]").await.unwrap();
        store.set("userToken", b"u_1").await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.get("users").await.unwrap(), None);
        assert_eq!(store.get("userToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FsKeyValueStore::new(dir.path().to_path_buf()).await.unwrap();

        assert!(store.get("../outside").await.is_err());
        assert!(store.set("a/b", b"x").await.is_err());
    }

    #[tokio::test]
    async fn memory_store_basics() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("users").await.unwrap(), None);
        store.set("users", b"[]").await.unwrap();
        assert_eq!(store.get("users").await.unwrap(), Some(b"[]".to_vec()));
        store.clear().await.unwrap();
        assert_eq!(store.get("users").await.unwrap(), None);
    }
}
