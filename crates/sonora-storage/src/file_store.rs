//! Local file store implementation.
//!
//! `LocalFileStore` serves as the durable hierarchical mirror on platforms
//! that have a file system. All operations are rooted at the data root;
//! store-relative paths that try to escape it are rejected.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use sonora_core::error::{Result, SonoraError};
use sonora_core::store::FileStore;

/// A `FileStore` backed by the local file system, rooted at a directory.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Opens (and creates if missing) a store rooted at `root`.
    pub async fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).await.map_err(|e| {
            SonoraError::io(format!(
                "failed to create store root '{}': {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins a store-relative path onto the root, rejecting absolute paths
    /// and parent-directory components.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(SonoraError::io(format!(
                "path '{path}' escapes the store root"
            )));
        }
        Ok(self.root.join(rel))
    }

    async fn ensure_parent(&self, full: &Path) -> Result<()> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SonoraError::io(format!(
                    "failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full)
            .await
            .map_err(|e| SonoraError::io(format!("failed to read '{path}': {e}")))
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        self.ensure_parent(&full).await?;
        fs::write(&full, bytes)
            .await
            .map_err(|e| SonoraError::io(format!("failed to write '{path}': {e}")))
    }

    async fn copy_in(&self, source: &Path, dest: &str) -> Result<()> {
        let full = self.resolve(dest)?;
        self.ensure_parent(&full).await?;
        fs::copy(source, &full).await.map_err(|e| {
            SonoraError::io(format!(
                "failed to copy '{}' to '{dest}': {e}",
                source.display()
            ))
        })?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::remove_file(&full)
            .await
            .map_err(|e| SonoraError::io(format!("failed to delete '{path}': {e}")))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SonoraError::io(format!(
                "failed to stat '{path}': {e}"
            ))),
        }
    }

    async fn make_dir_all(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full)
            .await
            .map_err(|e| SonoraError::io(format!("failed to create '{path}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (LocalFileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn write_read_round_trip() {
        let (store, _dir) = store().await;
        store.write("users.json", b"[]").await.unwrap();
        assert_eq!(store.read("users.json").await.unwrap(), b"[]");
    }

    #[tokio::test]
    async fn write_creates_parent_directories() {
        let (store, dir) = store().await;
        store.write("img/perfil_u_1.jpg", b"jpeg").await.unwrap();
        assert!(dir.path().join("img/perfil_u_1.jpg").is_file());
    }

    #[tokio::test]
    async fn copy_in_imports_an_external_file() {
        let (store, _dir) = store().await;
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("pic.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();

        store.copy_in(&source, "img/perfil_u_2.jpg").await.unwrap();
        assert_eq!(store.read("img/perfil_u_2.jpg").await.unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn exists_and_delete() {
        let (store, _dir) = store().await;
        assert!(!store.exists("users.json").await.unwrap());
        store.write("users.json", b"[]").await.unwrap();
        assert!(store.exists("users.json").await.unwrap());
        store.delete("users.json").await.unwrap();
        assert!(!store.exists("users.json").await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_missing_file_errors() {
        let (store, _dir) = store().await;
        assert!(store.delete("missing.bin").await.is_err());
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let (store, _dir) = store().await;
        assert!(store.read("../outside").await.is_err());
        assert!(store.write("/etc/passwd", b"x").await.is_err());
        assert!(store.exists("a/../../b").await.is_err());
    }
}
