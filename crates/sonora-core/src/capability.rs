//! Platform capability detection.
//!
//! Some host platforms (the web build of the original app) have no
//! hierarchical file store at all. The capability is probed once at process
//! start and threaded through as configuration; components branch on the
//! flag explicitly instead of attempting file operations and recovering from
//! the failure.

/// Capabilities of the current platform, evaluated once and treated as
/// constant for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    file_store: bool,
}

impl Capabilities {
    /// Detects the capabilities of the current platform.
    ///
    /// The durable file store is unavailable on `wasm32` targets; everywhere
    /// else it is assumed present.
    pub fn detect() -> Self {
        Self {
            file_store: !cfg!(target_arch = "wasm32"),
        }
    }

    /// Builds capabilities with an explicit file-store flag.
    ///
    /// Used by tests and by hosts that want to force the key-value-only
    /// configuration.
    pub fn with_file_store(file_store: bool) -> Self {
        Self { file_store }
    }

    /// Whether the durable hierarchical file store is available.
    pub fn file_store(&self) -> bool {
        self.file_store
    }
}
