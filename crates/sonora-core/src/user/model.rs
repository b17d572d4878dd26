//! User account domain models.
//!
//! `UserRecord` is the persisted account; it serializes in camelCase so the
//! durable manifest keeps the wire schema the app has always written
//! (`createdAt`, `avatar: null`, ...).

use serde::{Deserialize, Serialize};

/// One user account, as stored in the collection and in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique, immutable, generated at creation (`u_<unix millis>`).
    pub id: String,
    /// Unique among all records, case-insensitive.
    pub username: String,
    /// Unique among all records, case-insensitive; stored lowercased.
    pub email: String,
    /// Opaque credential in its stored form (see `credential`).
    pub password: String,
    /// Reference to the profile image asset, or `None` for no custom avatar.
    /// Either the user's asset slot path or, when the durable store is
    /// unavailable, the untouched source reference.
    pub avatar: Option<String>,
    /// Free text; length is bounded by the producing collaborator.
    pub bio: String,
    /// ISO-8601 timestamp, set once at creation, never mutated.
    pub created_at: String,
}

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Optional source image reference picked at signup time.
    pub avatar: Option<String>,
}

/// A shallow-merge patch for an existing account.
///
/// Absent fields are preserved. `avatar` is doubly optional because a patch
/// must be able to distinguish "leave alone" (`None`) from "clear"
/// (`Some(None)`); the remaining fields are mandatory strings and can only
/// be replaced, never cleared. `id` and `created_at` are not patchable.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<Option<String>>,
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserRecord {
        UserRecord {
            id: "u_1700000000000".to_string(),
            username: "ana_b".to_string(),
            email: "ana@x.com".to_string(),
            password: "secret1".to_string(),
            avatar: None,
            bio: String::new(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn serializes_with_manifest_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
        // A missing avatar is an explicit null on the wire, not an absent key.
        assert!(json.get("avatar").unwrap().is_null());
    }

    #[test]
    fn round_trips_through_manifest_json() {
        let record = UserRecord {
            avatar: Some("img/perfil_u_1.jpg".to_string()),
            ..sample()
        };
        let json = serde_json::to_string_pretty(&record).unwrap();
        let back: UserRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn default_update_patches_nothing() {
        let update = UserUpdate::default();
        assert!(update.username.is_none());
        assert!(update.avatar.is_none());
    }
}
