//! Session manager.
//!
//! Owns the single "current session" pointer, persisted in the key-value
//! store under the key the app has always used (`userToken`). Login sets the
//! pointer unconditionally; whether the id still resolves to a record is
//! decided at read time by the repository, so an orphaned pointer is just
//! "no session".

use std::sync::Arc;

use sonora_core::error::{Result, SonoraError};
use sonora_core::session::SessionState;
use sonora_core::store::KeyValueStore;

/// Key-value key holding the current session's user id.
pub const SESSION_KEY: &str = "userToken";

/// Manages the session pointer lifecycle: login, logout, lookup.
///
/// The pointer survives restarts because it lives in the persistent
/// key-value store; initial state on process start is whatever was last
/// persisted.
pub struct SessionManager {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionManager {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Sets the session pointer to `user_id`.
    ///
    /// No validation that the id resolves; re-login over an existing session
    /// simply overwrites the pointer.
    pub async fn login(&self, user_id: &str) -> Result<()> {
        tracing::debug!("session login as '{user_id}'");
        self.kv.set(SESSION_KEY, user_id.as_bytes()).await
    }

    /// Clears the session pointer.
    pub async fn logout(&self) -> Result<()> {
        tracing::debug!("session logout");
        self.kv.remove(SESSION_KEY).await
    }

    /// The current session's user id, or `None` when logged out.
    pub async fn current_session_id(&self) -> Result<Option<String>> {
        match self.kv.get(SESSION_KEY).await? {
            Some(bytes) => decode_session_id(bytes).map(Some),
            None => Ok(None),
        }
    }

    /// The session state derived from the persisted pointer.
    pub async fn session_state(&self) -> Result<SessionState> {
        Ok(match self.current_session_id().await? {
            Some(id) => SessionState::Authenticated(id),
            None => SessionState::Anonymous,
        })
    }
}

/// Decodes a stored session pointer. A pointer that is not valid UTF-8 is
/// corrupt data, not an orphan, and reads as a StoreRead failure.
pub(crate) fn decode_session_id(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| SonoraError::store_read(SESSION_KEY, format!("not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn starts_anonymous() {
        let sessions = manager();
        assert_eq!(sessions.current_session_id().await.unwrap(), None);
        assert_eq!(
            sessions.session_state().await.unwrap(),
            SessionState::Anonymous
        );
    }

    #[tokio::test]
    async fn login_then_logout() {
        let sessions = manager();
        sessions.login("u_1").await.unwrap();
        assert_eq!(
            sessions.current_session_id().await.unwrap(),
            Some("u_1".to_string())
        );
        assert!(sessions.session_state().await.unwrap().is_authenticated());

        sessions.logout().await.unwrap();
        assert_eq!(sessions.current_session_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn relogin_overwrites_without_logout() {
        let sessions = manager();
        sessions.login("u_1").await.unwrap();
        sessions.login("u_2").await.unwrap();
        assert_eq!(
            sessions.current_session_id().await.unwrap(),
            Some("u_2".to_string())
        );
    }

    #[tokio::test]
    async fn corrupt_pointer_is_a_store_read_error() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(SESSION_KEY, &[0xff, 0xfe]).await.unwrap();
        let sessions = SessionManager::new(kv);
        let err = sessions.current_session_id().await.unwrap_err();
        assert!(err.is_store_read());
    }
}
