//! User types

use serde::{Deserialize, Serialize};

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        Ok(Self(s.parse()?))
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Maximum length of a display name, in characters
pub const MAX_NAME_LENGTH: usize = 12;

/// Validated display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and wrap a display name.
    ///
    /// Names must be non-empty and at most [`MAX_NAME_LENGTH`] characters.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidName> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidName::Empty);
        }
        let chars = name.chars().count();
        if chars > MAX_NAME_LENGTH {
            return Err(InvalidName::TooLong {
                actual: chars,
                maximum: MAX_NAME_LENGTH,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invalid display name
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvalidName {
    #[error("name must not be empty")]
    Empty,

    #[error("name too long: {actual} characters, maximum {maximum}")]
    TooLong { actual: usize, maximum: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_parse() {
        assert_eq!(UserId::parse("42").unwrap(), UserId(42));
        assert!(UserId::parse("not-a-number").is_err());
    }

    #[test]
    fn test_display_name_validation() {
        assert!(DisplayName::new("Taro").is_ok());
        assert!(matches!(DisplayName::new(""), Err(InvalidName::Empty)));
        // 13 characters, one over the limit
        assert!(matches!(
            DisplayName::new("abcdefghijklm"),
            Err(InvalidName::TooLong { actual: 13, .. })
        ));
        // Multibyte characters count as single characters
        assert!(DisplayName::new("たろうたろうたろうたろう").is_ok());
    }
}
