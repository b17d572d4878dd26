//! Path layout for the sonora data root.
//!
//! Everything lives under one data root (platform data dir + `sonora` by
//! default, overridable for tests and diagnostics):
//!
//! ```text
//! <root>/
//! ├── kv/                  key-value entries, one file per key
//! ├── users.json           durable manifest (full record collection)
//! └── img/
//!     └── perfil_<id>.jpg  one fixed asset slot per user
//! ```
//!
//! The manifest name and the `perfil_<id>.jpg` slot naming are kept from the
//! original app so existing exported data stays readable.

use std::path::{Path, PathBuf};

use sonora_core::error::{Result, SonoraError};

/// Durable manifest file name, relative to the data root.
pub const MANIFEST_FILE: &str = "users.json";

/// Image asset directory name, relative to the data root.
pub const IMAGE_DIR: &str = "img";

/// Key-value entry directory name, relative to the data root.
pub const KV_DIR: &str = "kv";

/// The asset slot for a user, relative to the data root.
///
/// One deterministic slot per user id; a second image write to the same user
/// overwrites this path instead of accumulating files.
pub fn avatar_slot(user_id: &str) -> String {
    format!("{IMAGE_DIR}/perfil_{user_id}.jpg")
}

/// Resolved path layout rooted at a data directory.
#[derive(Debug, Clone)]
pub struct SonoraPaths {
    root: PathBuf,
}

impl SonoraPaths {
    /// Resolves the default data root for the platform.
    pub fn new() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| SonoraError::io("platform data directory unavailable"))?;
        Ok(Self {
            root: base.join("sonora"),
        })
    }

    /// Uses an explicit data root instead of the platform default.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// The data root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the key-value entries.
    pub fn kv_dir(&self) -> PathBuf {
        self.root.join(KV_DIR)
    }

    /// Absolute path of the durable manifest.
    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Absolute path of the image asset directory.
    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR)
    }

    /// Absolute path of a user's asset slot.
    pub fn avatar_file(&self, user_id: &str) -> PathBuf {
        self.root.join(avatar_slot(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_hangs_off_the_root() {
        let paths = SonoraPaths::with_root(PathBuf::from("/tmp/sonora-test"));
        assert!(paths.kv_dir().starts_with(paths.root()));
        assert!(paths.manifest_file().ends_with("users.json"));
        assert!(paths.image_dir().ends_with("img"));
    }

    #[test]
    fn avatar_slot_is_deterministic_per_user() {
        assert_eq!(avatar_slot("u_17"), "img/perfil_u_17.jpg");
        let paths = SonoraPaths::with_root(PathBuf::from("/tmp/sonora-test"));
        assert!(paths.avatar_file("u_17").ends_with("img/perfil_u_17.jpg"));
        assert_eq!(paths.avatar_file("u_17"), paths.avatar_file("u_17"));
    }
}
