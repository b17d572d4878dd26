//! Store bootstrap.
//!
//! Opens the process-wide stores once, according to the platform
//! capabilities, so the capability branch lives in exactly one place. The
//! repository and session manager are then constructed over the shared
//! handles.

use std::sync::Arc;

use sonora_core::capability::Capabilities;
use sonora_core::error::Result;
use sonora_core::store::{FileStore, KeyValueStore};

use crate::file_store::LocalFileStore;
use crate::kv::FsKeyValueStore;
use crate::paths::SonoraPaths;

/// The opened process-wide stores.
pub struct Stores {
    /// Source of truth, always present.
    pub key_value: Arc<dyn KeyValueStore>,
    /// Durable mirror; `None` when the platform has no file store.
    pub files: Option<Arc<dyn FileStore>>,
}

impl Stores {
    /// Opens the stores under the given data root.
    pub async fn open(caps: Capabilities, paths: &SonoraPaths) -> Result<Self> {
        let key_value: Arc<dyn KeyValueStore> =
            Arc::new(FsKeyValueStore::new(paths.kv_dir()).await?);
        let files: Option<Arc<dyn FileStore>> = if caps.file_store() {
            Some(Arc::new(
                LocalFileStore::new(paths.root().to_path_buf()).await?,
            ))
        } else {
            None
        };
        Ok(Self { key_value, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_with_file_store() {
        let dir = TempDir::new().unwrap();
        let paths = SonoraPaths::with_root(dir.path().to_path_buf());
        let stores = Stores::open(Capabilities::with_file_store(true), &paths)
            .await
            .unwrap();
        assert!(stores.files.is_some());
        assert!(paths.kv_dir().is_dir());
    }

    #[tokio::test]
    async fn open_without_file_store() {
        let dir = TempDir::new().unwrap();
        let paths = SonoraPaths::with_root(dir.path().to_path_buf());
        let stores = Stores::open(Capabilities::with_file_store(false), &paths)
            .await
            .unwrap();
        assert!(stores.files.is_none());
    }
}
