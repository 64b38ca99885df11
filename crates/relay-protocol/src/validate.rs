//! Validators for the wire shapes in the parent module.
//!
//! Kept dependency-free (no `regex` crate): the session code alphabet is
//! small and fixed, so a byte-by-byte check is both clearer and cheaper than
//! compiling a pattern per request.

use thiserror::Error;

/// Session codes are exactly 8 characters from the base32 alphabet `A-Z2-7`.
pub const SESSION_CODE_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid session code")]
    InvalidSessionCode,
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// `^[A-Z2-7]{8}$`
pub fn is_valid_session_code(code: &str) -> bool {
    code.len() == SESSION_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
}

pub fn validate_session_code(code: &str) -> Result<(), ValidationError> {
    if is_valid_session_code(code) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSessionCode)
    }
}

pub fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_codes() {
        assert!(is_valid_session_code("ABCDEFGH"));
        assert!(is_valid_session_code("A2345677"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_session_code("ABCDEFG"));
        assert!(!is_valid_session_code("ABCDEFGHI"));
    }

    #[test]
    fn rejects_excluded_digits_and_lowercase() {
        assert!(!is_valid_session_code("ABCDEFG0"));
        assert!(!is_valid_session_code("ABCDEFG1"));
        assert!(!is_valid_session_code("ABCDEFG8"));
        assert!(!is_valid_session_code("ABCDEFG9"));
        assert!(!is_valid_session_code("abcdefgh"));
    }

    #[test]
    fn validate_non_empty_rejects_blank_and_accepts_text() {
        assert_eq!(
            validate_non_empty("id", ""),
            Err(ValidationError::Empty { field: "id" })
        );
        assert_eq!(validate_non_empty("id", "r1"), Ok(()));
    }
}
