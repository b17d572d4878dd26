//! Error types for the sonora persistence layer.

use thiserror::Error;

/// A shared error type for the sonora crates.
///
/// Variants map one-to-one onto the failure modes of the dual-store design:
/// unreadable persisted data, uniqueness violations, missing records, asset
/// copy failures, and durable-mirror failures. Correctness-critical store
/// failures propagate to the caller; mirror failures are recorded and logged
/// by the repository instead of being returned.
#[derive(Error, Debug, Clone)]
pub enum SonoraError {
    /// Persisted bytes exist but cannot be parsed. Fatal to the calling
    /// read; never silently treated as an empty collection.
    #[error("stored data for '{key}' is unreadable: {message}")]
    StoreRead { key: String, message: String },

    /// Another record already owns this username (case-insensitive).
    #[error("a user with username '{username}' already exists")]
    DuplicateUsername { username: String },

    /// Another record already owns this e-mail address (case-insensitive).
    #[error("a user with e-mail '{email}' already exists")]
    DuplicateEmail { email: String },

    /// The operation targeted an id with no corresponding record.
    #[error("user '{id}' not found")]
    UserNotFound { id: String },

    /// Copying an image into a user's asset slot failed.
    ///
    /// The field is named `source_path` rather than `source` because
    /// `thiserror` treats any field named `source` as the error's cause and
    /// requires it to implement `std::error::Error`.
    #[error("failed to copy asset from '{source_path}': {message}")]
    AssetCopy {
        source_path: String,
        message: String,
    },

    /// A write to the durable file store failed, or the durable store was
    /// required but is unavailable on this platform.
    #[error("durable store failure: {message}")]
    DurableMirror { message: String },

    /// File system or key-value store I/O error.
    #[error("IO error: {message}")]
    Io { message: String },
}

impl SonoraError {
    /// Creates a StoreRead error.
    pub fn store_read(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreRead {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a UserNotFound error.
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    /// Creates an AssetCopy error.
    pub fn asset_copy(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssetCopy {
            source_path: source.into(),
            message: message.into(),
        }
    }

    /// Creates a DurableMirror error.
    pub fn durable_mirror(message: impl Into<String>) -> Self {
        Self::DurableMirror {
            message: message.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Check if this is a UserNotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound { .. })
    }

    /// Check if this is a uniqueness violation (username or e-mail).
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateUsername { .. } | Self::DuplicateEmail { .. }
        )
    }

    /// Check if this is a StoreRead error.
    pub fn is_store_read(&self) -> bool {
        matches!(self, Self::StoreRead { .. })
    }

    /// Check if this is a DurableMirror error.
    pub fn is_durable_mirror(&self) -> bool {
        matches!(self, Self::DurableMirror { .. })
    }
}

impl From<std::io::Error> for SonoraError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

/// A type alias for `Result<T, SonoraError>`.
pub type Result<T> = std::result::Result<T, SonoraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_errors_name_the_violated_constraint() {
        let err = SonoraError::DuplicateEmail {
            email: "ana@x.com".to_string(),
        };
        assert!(err.to_string().contains("ana@x.com"));
        assert!(err.is_duplicate());

        let err = SonoraError::DuplicateUsername {
            username: "ana_b".to_string(),
        };
        assert!(err.to_string().contains("ana_b"));
        assert!(err.is_duplicate());
    }

    #[test]
    fn not_found_predicate() {
        let err = SonoraError::user_not_found("u_123");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
        assert_eq!(err.to_string(), "user 'u_123' not found");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SonoraError = io.into();
        assert!(matches!(err, SonoraError::Io { .. }));
    }
}
