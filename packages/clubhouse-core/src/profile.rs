//! # Profiles
//!
//! Profile identity as seen by the mention pipeline and access checks.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PROFILE FIELDS                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  id: ProfileId (immutable)                                             │
//! │  ─────────────────────────                                              │
//! │  Primary key. Embedded in mention tokens, never changes.               │
//! │                                                                         │
//! │  username: String (unique, mutable)                                    │
//! │  ──────────────────────────────────                                     │
//! │  What authors type after `@`. May be renamed at any time, which is    │
//! │  why stored content never contains it.                                 │
//! │                                                                         │
//! │  full_name / avatar_url                                                │
//! │  ──────────────────────                                                 │
//! │  Display data, also searched by the search condition builder.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable profile identifier.
///
/// Production IDs are UUIDs, but any token-safe string is accepted so that
/// fixtures can use short IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Wrap an existing ID string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random (v4) UUID identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProfileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Minimal profile shape returned by username lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    /// Immutable ID
    pub id: ProfileId,
    /// Current username
    pub username: String,
}

/// Full profile as returned by ID and text lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Immutable ID
    pub id: ProfileId,
    /// Current username (unique)
    pub username: String,
    /// Human-readable full name
    pub full_name: String,
    /// Optional avatar URL
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Create a profile without an avatar.
    pub fn new(id: impl Into<ProfileId>, username: &str, full_name: &str) -> Self {
        Self {
            id: id.into(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            avatar_url: None,
        }
    }

    /// Narrow to the username-lookup shape.
    pub fn to_ref(&self) -> ProfileRef {
        ProfileRef {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }

    /// Case-insensitive containment test over username and full name.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.username.to_lowercase().contains(&needle)
            || self.full_name.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuids() {
        let id = ProfileId::generate();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, ProfileId::generate());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = ProfileId::new("u1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u1\"");
    }

    #[test]
    fn test_matches_text() {
        let p = Profile::new("u1", "annie", "Ann Lee");
        assert!(p.matches_text("ANN"));
        assert!(p.matches_text("lee"));
        assert!(!p.matches_text("bob"));
    }
}
