//! Table and column names accepted by existence rules
//!
//! Names from rule specs end up in SQL as identifiers, which cannot be bound
//! as query parameters. They are checked when the rule is resolved so a bad
//! name is a configuration error rather than a failed lookup.

use thiserror::Error;

/// Characters allowed in identifiers (alphanumeric, underscore, dollar)
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// PostgreSQL truncates identifiers beyond this many bytes
pub const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier cannot be empty")]
    Empty,

    #[error("identifier '{identifier}' is too long (max {MAX_IDENTIFIER_LEN} characters)")]
    TooLong { identifier: String },

    #[error("identifier '{identifier}' contains invalid character '{character}'")]
    InvalidCharacter { identifier: String, character: char },

    #[error("identifier '{identifier}' cannot start with a number")]
    LeadingDigit { identifier: String },
}

/// Validate that an identifier is safe to interpolate after quoting
pub fn validate_identifier(identifier: &str) -> Result<(), IdentifierError> {
    let Some(first) = identifier.chars().next() else {
        return Err(IdentifierError::Empty);
    };

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierError::TooLong {
            identifier: identifier.to_string(),
        });
    }

    if let Some(character) = identifier
        .chars()
        .find(|c| !ALLOWED_IDENTIFIER_CHARS.contains(*c))
    {
        return Err(IdentifierError::InvalidCharacter {
            identifier: identifier.to_string(),
            character,
        });
    }

    if first.is_ascii_digit() {
        return Err(IdentifierError::LeadingDigit {
            identifier: identifier.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_identifiers() {
        for ok in ["users", "user_emails", "_tmp", "t$1", "User", "order"] {
            assert!(validate_identifier(ok).is_ok(), "{} should be valid", ok);
        }
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for bad in ["users; DROP TABLE users", "users--", "a.b", "na\"me", "e mail"] {
            assert!(
                matches!(
                    validate_identifier(bad),
                    Err(IdentifierError::InvalidCharacter { .. })
                ),
                "{:?} should be invalid",
                bad
            );
        }
        assert_eq!(validate_identifier(""), Err(IdentifierError::Empty));
        assert!(matches!(
            validate_identifier("1users"),
            Err(IdentifierError::LeadingDigit { .. })
        ));
    }

    #[test]
    fn test_length_limit() {
        assert!(matches!(
            validate_identifier(&"x".repeat(64)),
            Err(IdentifierError::TooLong { .. })
        ));
        assert!(validate_identifier(&"x".repeat(63)).is_ok());
    }
}
