//! Store abstractions for the dual-store design.
//!
//! `KeyValueStore` is the source of truth: always available, logically
//! atomic per key. `FileStore` is the durable hierarchical mirror, only
//! constructed on platforms whose [`Capabilities`] report support.
//!
//! [`Capabilities`]: crate::capability::Capabilities

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Asynchronous get/set/remove/clear over a persistent key space.
///
/// Every durable-store operation is derived from this store, never the
/// reverse (the one sanctioned exception being an explicit manifest import).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key in the store.
    async fn clear(&self) -> Result<()>;
}

/// Asynchronous hierarchical file operations, rooted at a store directory.
///
/// All paths are store-relative. Implementations must reject paths that
/// escape the root.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Reads the full contents of a file.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Writes `bytes` to a file, creating parent directories as needed.
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Copies an external file (an absolute host path) into the store.
    async fn copy_in(&self, source: &Path, dest: &str) -> Result<()>;

    /// Deletes a file. Deleting a missing file is an error; callers that
    /// want idempotence check `exists` first.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Whether the path exists in the store.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Creates a directory and all missing parents.
    async fn make_dir_all(&self, path: &str) -> Result<()>;
}
