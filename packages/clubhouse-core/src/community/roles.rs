//! # Club Roles and Forum Permission Levels
//!
//! Both are ordinal tiers compared against each other by the permission
//! evaluator.
//!
//! ```text
//!   ClubRole            ordinal        PermissionLevel     ordinal
//!   ───────────────     ───────        ───────────────     ───────
//!   (not a member)        -1           Public                 0
//!   GeneralMember          1           Member                 1
//!   FullMember             2           FullMember             2
//!   Leader                 3           Leader                 3
//! ```

use serde::{Deserialize, Serialize};

/// A profile's membership tier within one club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubRole {
    /// Newly joined member
    GeneralMember,
    /// Promoted member
    FullMember,
    /// Club leader
    Leader,
}

impl ClubRole {
    /// All roles, lowest first.
    pub const ALL: [ClubRole; 3] = [
        ClubRole::GeneralMember,
        ClubRole::FullMember,
        ClubRole::Leader,
    ];

    /// Ordinal rank (higher = more authority).
    pub fn ordinal(&self) -> i8 {
        match self {
            ClubRole::GeneralMember => 1,
            ClubRole::FullMember => 2,
            ClubRole::Leader => 3,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClubRole::GeneralMember => "general_member",
            ClubRole::FullMember => "full_member",
            ClubRole::Leader => "leader",
        }
    }

    /// Parse from a stored or user-supplied string.
    ///
    /// Case-insensitive; `-` and `_` are interchangeable. Unknown values
    /// yield `None`, which the evaluator treats as a non-member.
    pub fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "general_member" => Some(ClubRole::GeneralMember),
            "full_member" => Some(ClubRole::FullMember),
            "leader" => Some(ClubRole::Leader),
            _ => None,
        }
    }
}

/// Ordinal for an optional role; non-members rank below everything.
pub fn role_ordinal(role: Option<ClubRole>) -> i8 {
    role.map_or(-1, |r| r.ordinal())
}

/// Minimum tier a forum requires for reading or writing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Anyone, members or not
    Public,
    /// Any club member
    #[default]
    Member,
    /// Full members and leaders
    FullMember,
    /// Leaders only
    Leader,
}

impl PermissionLevel {
    /// All levels, lowest first.
    pub const ALL: [PermissionLevel; 4] = [
        PermissionLevel::Public,
        PermissionLevel::Member,
        PermissionLevel::FullMember,
        PermissionLevel::Leader,
    ];

    /// Ordinal rank (higher = stricter).
    pub fn ordinal(&self) -> i8 {
        match self {
            PermissionLevel::Public => 0,
            PermissionLevel::Member => 1,
            PermissionLevel::FullMember => 2,
            PermissionLevel::Leader => 3,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Public => "public",
            PermissionLevel::Member => "member",
            PermissionLevel::FullMember => "full_member",
            PermissionLevel::Leader => "leader",
        }
    }

    /// Parse from a stored or user-supplied string.
    pub fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "public" => Some(PermissionLevel::Public),
            "member" => Some(PermissionLevel::Member),
            "full_member" => Some(PermissionLevel::FullMember),
            "leader" => Some(PermissionLevel::Leader),
            _ => None,
        }
    }

    /// Parse, falling back to the strictest level for unknown values.
    pub fn parse_or_strictest(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!(value = s, "Unknown permission level, treating as leader-only");
            PermissionLevel::Leader
        })
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_order() {
        assert!(ClubRole::GeneralMember < ClubRole::FullMember);
        assert!(ClubRole::FullMember < ClubRole::Leader);
        assert_eq!(role_ordinal(None), -1);
        assert_eq!(role_ordinal(Some(ClubRole::Leader)), 3);
    }

    #[test]
    fn test_level_order() {
        let ords: Vec<i8> = PermissionLevel::ALL.iter().map(|l| l.ordinal()).collect();
        assert_eq!(ords, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_parse_roles() {
        assert_eq!(ClubRole::parse("GENERAL_MEMBER"), Some(ClubRole::GeneralMember));
        assert_eq!(ClubRole::parse("full-member"), Some(ClubRole::FullMember));
        assert_eq!(ClubRole::parse(" leader "), Some(ClubRole::Leader));
        assert_eq!(ClubRole::parse("owner"), None);
        assert_eq!(ClubRole::parse(""), None);
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!(PermissionLevel::parse("PUBLIC"), Some(PermissionLevel::Public));
        assert_eq!(PermissionLevel::parse("full_member"), Some(PermissionLevel::FullMember));
        assert_eq!(PermissionLevel::parse("admins"), None);
        assert_eq!(PermissionLevel::parse_or_strictest("admins"), PermissionLevel::Leader);
    }

    #[test]
    fn test_string_roundtrip() {
        for role in ClubRole::ALL {
            assert_eq!(ClubRole::parse(role.as_str()), Some(role));
        }
        for level in PermissionLevel::ALL {
            assert_eq!(PermissionLevel::parse(level.as_str()), Some(level));
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&ClubRole::GeneralMember).unwrap(),
            "\"general_member\""
        );
        let level: PermissionLevel = serde_json::from_str("\"full_member\"").unwrap();
        assert_eq!(level, PermissionLevel::FullMember);
    }
}
