//! User repository: the dual-store record and asset operations.
//!
//! Owns the user record collection and composes the two stores. The
//! key-value store is the source of truth; every mutation is "read full
//! collection, mutate, write full collection" against it, and its write
//! defines the operation's success. The durable file store, when the
//! platform has one, receives a best-effort JSON-manifest mirror after each
//! successful write and holds the per-user image asset slots. Mirror
//! failures are logged and kept on a side channel, never returned to the
//! caller of the primary operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use sonora_core::credential::{CredentialScheme, PlainTextCredentials};
use sonora_core::error::{Result, SonoraError};
use sonora_core::store::{FileStore, KeyValueStore};
use sonora_core::user::{NewUser, UserRecord, UserUpdate};

use crate::paths::{self, SonoraPaths, IMAGE_DIR, MANIFEST_FILE};
use crate::session::{decode_session_id, SESSION_KEY};

/// Key-value key holding the full record collection as a JSON array.
pub const USERS_KEY: &str = "users";

/// Diagnostics snapshot of the persistence layer, for debug surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageReport {
    pub file_store_available: bool,
    pub data_root: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest_exists: bool,
    pub image_dir_exists: bool,
    pub total_users: usize,
}

/// Repository over the user record collection and its image assets.
///
/// Mutating operations are serialized through an internal write guard; the
/// collection read-mutate-write is one indivisible unit of work per call.
/// Reads run without the guard and may overlap freely.
pub struct UserRepository {
    kv: Arc<dyn KeyValueStore>,
    /// `None` when the platform has no durable file store.
    files: Option<Arc<dyn FileStore>>,
    paths: SonoraPaths,
    credentials: Arc<dyn CredentialScheme>,
    write_guard: Mutex<()>,
    last_mirror_error: Mutex<Option<SonoraError>>,
}

impl UserRepository {
    /// Creates a repository over the given stores.
    ///
    /// Pass `files: None` on platforms whose capabilities report no file
    /// store; the repository then keeps every asset reference as the opaque
    /// source URI and skips all mirroring.
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        files: Option<Arc<dyn FileStore>>,
        paths: SonoraPaths,
    ) -> Self {
        Self::with_credentials(kv, files, paths, Arc::new(PlainTextCredentials))
    }

    /// Creates a repository with an explicit credential scheme.
    pub fn with_credentials(
        kv: Arc<dyn KeyValueStore>,
        files: Option<Arc<dyn FileStore>>,
        paths: SonoraPaths,
        credentials: Arc<dyn CredentialScheme>,
    ) -> Self {
        Self {
            kv,
            files,
            paths,
            credentials,
            write_guard: Mutex::new(()),
            last_mirror_error: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// The full record collection.
    ///
    /// An absent key is an empty collection; present-but-unparseable bytes
    /// are a StoreRead failure, never silently empty.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.load_collection().await
    }

    /// Looks up one record by id.
    pub async fn get_user(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .load_collection()
            .await?
            .into_iter()
            .find(|u| u.id == id))
    }

    /// Resolves the session pointer to a record.
    ///
    /// Returns `None` when logged out or when the pointer references an id
    /// that no longer resolves (an orphaned pointer is not an error).
    pub async fn get_current_user(&self) -> Result<Option<UserRecord>> {
        let Some(bytes) = self.kv.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        let id = decode_session_id(bytes)?;
        self.get_user(&id).await
    }

    /// Finds the record matching an e-mail/password pair.
    ///
    /// E-mail comparison is case-insensitive; the password is checked
    /// through the credential scheme. A miss is `None`, not an error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<UserRecord>> {
        let email = email.trim().to_lowercase();
        Ok(self.load_collection().await?.into_iter().find(|u| {
            u.email.to_lowercase() == email && self.credentials.verify(password, &u.password)
        }))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Creates a new account.
    ///
    /// Validates username and e-mail uniqueness (case-insensitive), then
    /// generates the id and `createdAt`, stores the record, and mirrors. If
    /// a source avatar was supplied and the copy into the asset slot fails,
    /// the record falls back to the source reference; signup never fails
    /// over an image.
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserRecord> {
        let _guard = self.write_guard.lock().await;
        let mut users = self.load_collection().await?;

        let username = new_user.username.trim().to_string();
        let email = new_user.email.trim().to_lowercase();
        Self::check_unique(&users, &username, &email, None)?;

        let id = next_user_id(&users);
        let avatar = match &new_user.avatar {
            Some(source) => Some(self.store_avatar_lenient(&id, source).await),
            None => None,
        };

        let record = UserRecord {
            id,
            username,
            email,
            password: self.credentials.protect(&new_user.password),
            avatar,
            bio: String::new(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        users.push(record.clone());
        self.store_collection(&users).await?;
        self.mirror_to_manifest(&users).await;
        Ok(record)
    }

    /// Applies a shallow field merge to an existing record.
    ///
    /// Fields present in the patch overwrite; absent fields are preserved.
    /// `id` and `createdAt` never change. Changing username or e-mail
    /// re-checks uniqueness against the rest of the collection.
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<UserRecord> {
        let _guard = self.write_guard.lock().await;
        let mut users = self.load_collection().await?;
        let idx = Self::position(&users, id)?;

        let username = update
            .username
            .unwrap_or_else(|| users[idx].username.clone());
        let email = update.email.unwrap_or_else(|| users[idx].email.clone());
        Self::check_unique(&users, &username, &email, Some(id))?;

        {
            let user = &mut users[idx];
            user.username = username;
            user.email = email;
            if let Some(password) = update.password {
                user.password = self.credentials.protect(&password);
            }
            if let Some(bio) = update.bio {
                user.bio = bio;
            }
            if let Some(avatar) = update.avatar {
                user.avatar = avatar;
            }
        }
        let record = users[idx].clone();

        self.store_collection(&users).await?;
        self.mirror_to_manifest(&users).await;
        Ok(record)
    }

    /// Replaces a user's profile image.
    ///
    /// With a durable store, the source is copied into the user's fixed
    /// asset slot (a second write overwrites, never accumulates) and the
    /// slot path is stored and returned. Without one, the source reference
    /// is stored and returned unchanged. On copy failure the record is left
    /// unmodified.
    pub async fn update_profile_image(&self, id: &str, source: &str) -> Result<String> {
        let _guard = self.write_guard.lock().await;
        let mut users = self.load_collection().await?;
        let idx = Self::position(&users, id)?;

        let avatar = if self.files.is_some() {
            self.store_avatar(id, source).await?
        } else {
            source.to_string()
        };

        users[idx].avatar = Some(avatar.clone());
        self.store_collection(&users).await?;
        self.mirror_to_manifest(&users).await;
        Ok(avatar)
    }

    /// Deletes a record and its owned asset.
    ///
    /// The collection write defines success; removing the asset file is
    /// best effort, so a record can never become undeletable because of an
    /// orphaned image.
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let mut users = self.load_collection().await?;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(SonoraError::user_not_found(id));
        }

        self.store_collection(&users).await?;
        self.mirror_to_manifest(&users).await;
        self.discard_avatar(id).await;
        Ok(())
    }

    /// Clears the key-value store entirely: records and session pointer.
    ///
    /// Diagnostics/recovery operation; durable files are left in place.
    pub async fn clear_all(&self) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        self.kv.clear().await
    }

    // ------------------------------------------------------------------
    // Explicit manifest transfer
    // ------------------------------------------------------------------

    /// Writes the full collection to the durable manifest and returns the
    /// manifest's path.
    ///
    /// Unlike the automatic mirror, a failure here is returned: the caller
    /// explicitly asked for a file operation.
    pub async fn export_to_manifest(&self) -> Result<PathBuf> {
        let files = self.require_files()?;
        let users = self.load_collection().await?;
        self.write_manifest(files.as_ref(), &users).await?;
        Ok(self.paths.manifest_file())
    }

    /// Replaces the key-value collection with the manifest's contents.
    ///
    /// The one sanctioned reversal of the source-of-truth direction, meant
    /// as a deliberate recovery/migration action. A missing manifest imports
    /// nothing and returns an empty collection.
    pub async fn import_from_manifest(&self) -> Result<Vec<UserRecord>> {
        let _guard = self.write_guard.lock().await;
        let files = self.require_files()?;
        if !files.exists(MANIFEST_FILE).await? {
            return Ok(Vec::new());
        }
        let bytes = files.read(MANIFEST_FILE).await?;
        let users: Vec<UserRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| SonoraError::store_read(MANIFEST_FILE, e.to_string()))?;
        self.store_collection(&users).await?;
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Snapshot of the persistence layer for debug surfaces.
    pub async fn storage_report(&self) -> Result<StorageReport> {
        let total_users = self.load_collection().await?.len();
        let (manifest_exists, image_dir_exists) = match &self.files {
            Some(files) => (
                files.exists(MANIFEST_FILE).await.unwrap_or(false),
                files.exists(IMAGE_DIR).await.unwrap_or(false),
            ),
            None => (false, false),
        };
        Ok(StorageReport {
            file_store_available: self.files.is_some(),
            data_root: self.paths.root().to_path_buf(),
            manifest_path: self.paths.manifest_file(),
            manifest_exists,
            image_dir_exists,
            total_users,
        })
    }

    /// The most recent swallowed mirror failure, if any. Taking it clears
    /// the side channel.
    pub async fn take_mirror_error(&self) -> Option<SonoraError> {
        self.last_mirror_error.lock().await.take()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_collection(&self) -> Result<Vec<UserRecord>> {
        match self.kv.get(USERS_KEY).await? {
            None => Ok(Vec::new()),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SonoraError::store_read(USERS_KEY, e.to_string())),
        }
    }

    async fn store_collection(&self, users: &[UserRecord]) -> Result<()> {
        let bytes = serde_json::to_vec(users)
            .map_err(|e| SonoraError::io(format!("failed to serialize collection: {e}")))?;
        self.kv.set(USERS_KEY, &bytes).await
    }

    /// Mirrors the collection to the durable manifest, best effort. The
    /// key-value write already defined the operation's outcome, so failure
    /// here is logged and recorded, never returned.
    async fn mirror_to_manifest(&self, users: &[UserRecord]) {
        let Some(files) = &self.files else {
            tracing::debug!("durable store unavailable, skipping manifest mirror");
            return;
        };
        if let Err(err) = self.write_manifest(files.as_ref(), users).await {
            tracing::warn!("manifest mirror failed (non-fatal): {err}");
            *self.last_mirror_error.lock().await = Some(err);
        }
    }

    async fn write_manifest(&self, files: &dyn FileStore, users: &[UserRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(users)
            .map_err(|e| SonoraError::durable_mirror(format!("manifest serialization: {e}")))?;
        files
            .write(MANIFEST_FILE, &json)
            .await
            .map_err(|e| SonoraError::durable_mirror(e.to_string()))
    }

    /// Copies `source` into the user's asset slot and returns the slot's
    /// absolute path. Requires the durable store.
    async fn store_avatar(&self, id: &str, source: &str) -> Result<String> {
        let files = self.require_files()?;
        files
            .make_dir_all(IMAGE_DIR)
            .await
            .map_err(|e| SonoraError::asset_copy(source, e.to_string()))?;
        let slot = paths::avatar_slot(id);
        files
            .copy_in(Path::new(source), &slot)
            .await
            .map_err(|e| SonoraError::asset_copy(source, e.to_string()))?;
        Ok(self.paths.avatar_file(id).to_string_lossy().into_owned())
    }

    /// Signup-time avatar handling: a failed copy falls back to the source
    /// reference instead of failing the account creation.
    async fn store_avatar_lenient(&self, id: &str, source: &str) -> String {
        if self.files.is_none() {
            return source.to_string();
        }
        match self.store_avatar(id, source).await {
            Ok(slot) => slot,
            Err(err) => {
                tracing::warn!("avatar copy during signup failed (non-fatal): {err}");
                source.to_string()
            }
        }
    }

    /// Removes a deleted user's asset slot, best effort.
    async fn discard_avatar(&self, id: &str) {
        let Some(files) = &self.files else {
            return;
        };
        let slot = paths::avatar_slot(id);
        match files.exists(&slot).await {
            Ok(true) => {
                if let Err(err) = files.delete(&slot).await {
                    tracing::warn!("failed to remove avatar of deleted user '{id}': {err}");
                }
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!("failed to check avatar of deleted user '{id}': {err}");
            }
        }
    }

    fn require_files(&self) -> Result<&Arc<dyn FileStore>> {
        self.files
            .as_ref()
            .ok_or_else(|| SonoraError::durable_mirror("durable store unavailable on this platform"))
    }

    fn position(users: &[UserRecord], id: &str) -> Result<usize> {
        users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| SonoraError::user_not_found(id))
    }

    /// Uniqueness check over the live collection, case-insensitive, with an
    /// optional id to exclude (the record being updated).
    fn check_unique(
        users: &[UserRecord],
        username: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> Result<()> {
        let username_lower = username.to_lowercase();
        let email_lower = email.to_lowercase();
        for user in users {
            if exclude_id == Some(user.id.as_str()) {
                continue;
            }
            if user.username.to_lowercase() == username_lower {
                return Err(SonoraError::DuplicateUsername {
                    username: username.to_string(),
                });
            }
            if user.email.to_lowercase() == email_lower {
                return Err(SonoraError::DuplicateEmail {
                    email: email.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Generates a fresh record id: `u_<unix millis>`, bumped past any existing
/// id generated within the same millisecond.
fn next_user_id(users: &[UserRecord]) -> String {
    let mut stamp = Utc::now().timestamp_millis();
    loop {
        let id = format!("u_{stamp}");
        if !users.iter().any(|u| u.id == id) {
            return id;
        }
        stamp += 1;
    }
}
