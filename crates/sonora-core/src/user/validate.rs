//! Field format validation for user input.
//!
//! Offered to form-handling collaborators; the repository itself only
//! enforces uniqueness. Rules match what the signup form has always
//! accepted: usernames of 3+ characters over `[A-Za-z0-9_]`, e-mail
//! addresses of the shape `local@domain.tld` with no whitespace.

use thiserror::Error;

/// A field-format violation, specific enough to show to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must have at least 3 characters")]
    UsernameTooShort,
    #[error("username may only contain letters, numbers and '_'")]
    UsernameCharset,
    #[error("e-mail address is not valid")]
    EmailSyntax,
}

/// Validates a username: 3+ characters, `[A-Za-z0-9_]` only.
///
/// Leading and trailing whitespace is ignored (the repository trims before
/// storing).
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let trimmed = username.trim();
    if trimmed.chars().count() < 3 {
        return Err(ValidationError::UsernameTooShort);
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameCharset);
    }
    Ok(())
}

/// Validates e-mail syntax: exactly one `@`, non-empty local part, a domain
/// containing a dot with non-empty segments, no whitespace anywhere.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::EmailSyntax)
    }
}

/// Boolean form of [`validate_email`].
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_usernames() {
        assert!(validate_username("ana_b").is_ok());
        assert!(validate_username("  User99  ").is_ok());
        assert!(validate_username("abc").is_ok());
    }

    #[test]
    fn rejects_short_or_invalid_usernames() {
        assert_eq!(
            validate_username("ab"),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            validate_username("ana b"),
            Err(ValidationError::UsernameCharset)
        );
        assert_eq!(
            validate_username("ana-b"),
            Err(ValidationError::UsernameCharset)
        );
    }

    #[test]
    fn accepts_well_formed_emails() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("ana"));
        assert!(!is_valid_email("ana@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("ana@x."));
        assert!(!is_valid_email("ana@.com"));
        assert!(!is_valid_email("a na@x.com"));
        assert!(!is_valid_email("ana@@x.com"));
    }
}
