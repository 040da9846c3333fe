//! Caller identity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Principal`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    /// The input string is empty.
    #[error("principal cannot be empty")]
    Empty,
    /// The input is longer than any principal the identity provider issues.
    #[error("principal must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters outside the textual principal alphabet.
    #[error("principal contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// An opaque caller principal established by the identity provider.
///
/// The textual form is lowercase alphanumerics separated by dashes
/// (e.g. `2vxsx-fae`). The storefront never interprets it beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Maximum textual length accepted.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a textual principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains
    /// characters other than ASCII alphanumerics and `-`.
    pub fn parse(s: &str) -> Result<Self, PrincipalError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PrincipalError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(PrincipalError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
            return Err(PrincipalError::InvalidCharacter(c));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_parse_valid() {
        let p = Principal::parse("  AbC12-xyz ").unwrap();
        assert_eq!(p.as_str(), "abc12-xyz");
    }

    #[test]
    fn test_principal_parse_invalid() {
        assert_eq!(Principal::parse(""), Err(PrincipalError::Empty));
        assert_eq!(
            Principal::parse("a b"),
            Err(PrincipalError::InvalidCharacter(' '))
        );
        assert!(matches!(
            Principal::parse(&"a".repeat(200)),
            Err(PrincipalError::TooLong { .. })
        ));
    }
}
