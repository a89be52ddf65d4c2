//! # Forum Permission Evaluator
//!
//! The single source of truth for forum read/write authorization. Server-side
//! enforcement (fetching and saving posts) and UI gating (showing a "new
//! post" button) both call into this module.
//!
//! ## Permission Resolution
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   PERMISSION RESOLUTION ORDER                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Owner bypass: the club owner may always read and write             │
//! │  2. Non-member (no role):                                              │
//! │     a. read  → allowed only when the level is Public                   │
//! │     b. write → never allowed                                           │
//! │  3. Member: allowed iff role ordinal >= level ordinal                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use super::roles::{role_ordinal, ClubRole, PermissionLevel};
use crate::error::{Error, Result};

/// The kind of forum access being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumAction {
    /// View posts
    Read,
    /// Create or edit posts
    Write,
}

impl ForumAction {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForumAction::Read => "read",
            ForumAction::Write => "write",
        }
    }

    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Some(ForumAction::Read),
            "write" => Some(ForumAction::Write),
            _ => None,
        }
    }
}

/// A forum's two independent permission levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumLevels {
    /// Minimum tier to read
    pub read: PermissionLevel,
    /// Minimum tier to write
    pub write: PermissionLevel,
}

impl ForumLevels {
    /// The level governing `action`.
    pub fn for_action(&self, action: ForumAction) -> PermissionLevel {
        match action {
            ForumAction::Read => self.read,
            ForumAction::Write => self.write,
        }
    }
}

/// Stateless forum authorization rules.
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    /// Whether an actor may read a forum at `level`.
    pub fn can_read(role: Option<ClubRole>, is_owner: bool, level: PermissionLevel) -> bool {
        if is_owner {
            return true;
        }
        if level == PermissionLevel::Public {
            return true;
        }
        role_ordinal(role) >= level.ordinal()
    }

    /// Whether an actor may write to a forum at `level`.
    pub fn can_write(role: Option<ClubRole>, is_owner: bool, level: PermissionLevel) -> bool {
        if is_owner {
            return true;
        }
        match role {
            None => false,
            Some(r) => r.ordinal() >= level.ordinal(),
        }
    }

    /// Dispatch on the requested action.
    pub fn allows(
        action: ForumAction,
        role: Option<ClubRole>,
        is_owner: bool,
        level: PermissionLevel,
    ) -> bool {
        match action {
            ForumAction::Read => Self::can_read(role, is_owner, level),
            ForumAction::Write => Self::can_write(role, is_owner, level),
        }
    }
}

/// What the current viewer is within one club.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumAccess {
    /// Membership role, `None` for non-members and anonymous viewers
    pub role: Option<ClubRole>,
    /// Whether the viewer owns the club
    pub is_owner: bool,
}

impl ForumAccess {
    /// Anonymous or non-member viewer.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Club member with `role`.
    pub fn member(role: ClubRole) -> Self {
        Self {
            role: Some(role),
            is_owner: false,
        }
    }

    /// Club owner.
    pub fn owner(role: Option<ClubRole>) -> Self {
        Self {
            role,
            is_owner: true,
        }
    }

    /// UI gate: may this viewer read the forum?
    pub fn can_read(&self, levels: &ForumLevels) -> bool {
        PermissionEvaluator::can_read(self.role, self.is_owner, levels.read)
    }

    /// UI gate: may this viewer write to the forum?
    pub fn can_write(&self, levels: &ForumLevels) -> bool {
        PermissionEvaluator::can_write(self.role, self.is_owner, levels.write)
    }

    /// Enforcement for fetching posts.
    pub fn require_read(&self, levels: &ForumLevels) -> Result<()> {
        self.require(ForumAction::Read, levels)
    }

    /// Enforcement for saving posts.
    pub fn require_write(&self, levels: &ForumLevels) -> Result<()> {
        self.require(ForumAction::Write, levels)
    }

    /// Enforcement: error unless `action` is allowed.
    pub fn require(&self, action: ForumAction, levels: &ForumLevels) -> Result<()> {
        let level = levels.for_action(action);
        if PermissionEvaluator::allows(action, self.role, self.is_owner, level) {
            return Ok(());
        }
        tracing::debug!(
            action = action.as_str(),
            role = self.role.map(|r| r.as_str()).unwrap_or("none"),
            level = level.as_str(),
            "Forum access denied"
        );
        Err(Error::AccessDenied(format!(
            "{} requires {}",
            action.as_str(),
            level.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Option<ClubRole>; 4] = [
        None,
        Some(ClubRole::GeneralMember),
        Some(ClubRole::FullMember),
        Some(ClubRole::Leader),
    ];

    fn expected(action: ForumAction, role: Option<ClubRole>, level: PermissionLevel) -> bool {
        let role_ord: i8 = match role {
            None => -1,
            Some(ClubRole::GeneralMember) => 1,
            Some(ClubRole::FullMember) => 2,
            Some(ClubRole::Leader) => 3,
        };
        let level_ord: i8 = match level {
            PermissionLevel::Public => 0,
            PermissionLevel::Member => 1,
            PermissionLevel::FullMember => 2,
            PermissionLevel::Leader => 3,
        };
        match action {
            ForumAction::Read => level_ord == 0 || role_ord >= level_ord,
            ForumAction::Write => role.is_some() && role_ord >= level_ord,
        }
    }

    #[test]
    fn test_full_matrix() {
        for action in [ForumAction::Read, ForumAction::Write] {
            for role in ROLES {
                for level in PermissionLevel::ALL {
                    assert!(
                        PermissionEvaluator::allows(action, role, true, level),
                        "owner denied {:?} at {:?}",
                        action,
                        level
                    );
                    assert_eq!(
                        PermissionEvaluator::allows(action, role, false, level),
                        expected(action, role, level),
                        "{:?} {:?} {:?}",
                        action,
                        role,
                        level
                    );
                }
            }
        }
    }

    #[test]
    fn test_general_member_cannot_write_full_member_forum() {
        assert!(!PermissionEvaluator::can_write(
            Some(ClubRole::GeneralMember),
            false,
            PermissionLevel::FullMember
        ));
        assert!(PermissionEvaluator::can_write(
            Some(ClubRole::GeneralMember),
            true,
            PermissionLevel::FullMember
        ));
    }

    #[test]
    fn test_non_member_public_read_only() {
        assert!(PermissionEvaluator::can_read(None, false, PermissionLevel::Public));
        assert!(!PermissionEvaluator::can_read(None, false, PermissionLevel::Member));
        assert!(!PermissionEvaluator::can_write(None, false, PermissionLevel::Public));
    }

    #[test]
    fn test_unparseable_role_is_least_privileged() {
        let role = ClubRole::parse("superuser");
        assert!(!PermissionEvaluator::can_write(role, false, PermissionLevel::Public));
        assert!(PermissionEvaluator::can_read(role, false, PermissionLevel::Public));
    }

    #[test]
    fn test_access_require() {
        let levels = ForumLevels {
            read: PermissionLevel::Public,
            write: PermissionLevel::FullMember,
        };
        let general = ForumAccess::member(ClubRole::GeneralMember);
        assert!(general.require(ForumAction::Read, &levels).is_ok());
        let err = general.require(ForumAction::Write, &levels).unwrap_err();
        assert!(err.is_access_error());

        assert!(ForumAccess::owner(None).require_write(&levels).is_ok());
        assert!(ForumAccess::anonymous().require_read(&levels).is_ok());
        assert!(ForumAccess::anonymous().require_write(&levels).is_err());
        assert!(ForumAccess::anonymous().can_read(&levels));
        assert!(!ForumAccess::anonymous().can_write(&levels));
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(ForumAction::parse("WRITE"), Some(ForumAction::Write));
        assert_eq!(ForumAction::parse("delete"), None);
    }
}
