//! LINE identity value objects

use serde::{Deserialize, Serialize};

/// LINE user identifier (the `sub` claim of a LINE ID token)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineUserId(String);

impl LineUserId {
    /// Wrap a LINE user ID.
    ///
    /// The provider guarantees the format; we only reject empty values,
    /// which would otherwise collide in unique-index lookups.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidLineUserId> {
        let id = id.into();
        if id.is_empty() {
            return Err(InvalidLineUserId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for LineUserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Empty LINE user ID
#[derive(Debug, Clone, thiserror::Error)]
#[error("LINE user id must not be empty")]
pub struct InvalidLineUserId;
