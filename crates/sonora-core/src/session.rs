//! Session identity model.
//!
//! The persisted state is a single optional pointer to a user id. The
//! pointer is a weak reference: it may name an id that no longer resolves,
//! which readers treat as "no session", never as an error.

/// The two session states of a running instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session pointer is set.
    Anonymous,
    /// A session pointer names this user id. The id is not guaranteed to
    /// resolve to a record.
    Authenticated(String),
}

impl SessionState {
    /// Whether a session pointer is set.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The pointed-to user id, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_accessors() {
        assert!(!SessionState::Anonymous.is_authenticated());
        assert_eq!(SessionState::Anonymous.user_id(), None);

        let state = SessionState::Authenticated("u_1".to_string());
        assert!(state.is_authenticated());
        assert_eq!(state.user_id(), Some("u_1"));
    }
}
