//! Credential handling seam.
//!
//! Passwords are persisted as opaque strings. The repository never touches
//! them directly; it goes through a `CredentialScheme`, so hashing/salting
//! can be introduced later without changing the repository. The default
//! scheme stores credentials as given, which is a known weakness carried
//! forward from the original app rather than silently fixed.

/// Transforms raw credentials into their stored form and verifies raw
/// credentials against a stored form.
pub trait CredentialScheme: Send + Sync {
    /// Converts a raw password into the form persisted in the record.
    fn protect(&self, raw: &str) -> String;

    /// Checks a raw password against the persisted form.
    fn verify(&self, raw: &str, stored: &str) -> bool;
}

/// Stores credentials verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextCredentials;

impl CredentialScheme for PlainTextCredentials {
    fn protect(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn verify(&self, raw: &str, stored: &str) -> bool {
        raw == stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_round_trip() {
        let scheme = PlainTextCredentials;
        let stored = scheme.protect("secret1");
        assert_eq!(stored, "secret1");
        assert!(scheme.verify("secret1", &stored));
        assert!(!scheme.verify("secret2", &stored));
    }
}
