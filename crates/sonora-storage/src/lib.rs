//! Store implementations and services for sonora.
//!
//! The key-value store is the source of truth for records and the session
//! pointer; the local file store is the durable JSON-manifest mirror and the
//! home of the per-user image asset slots. `UserRepository` composes the two
//! into atomic-looking operations; `SessionManager` owns the session
//! pointer. `Stores::open` performs the one-time capability branch.

pub mod bootstrap;
pub mod file_store;
pub mod kv;
pub mod paths;
pub mod session;
pub mod user_repository;

pub use crate::bootstrap::Stores;
pub use crate::file_store::LocalFileStore;
pub use crate::kv::{FsKeyValueStore, MemoryKeyValueStore};
pub use crate::paths::SonoraPaths;
pub use crate::session::SessionManager;
pub use crate::user_repository::{StorageReport, UserRepository};
