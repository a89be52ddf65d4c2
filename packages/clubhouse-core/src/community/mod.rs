//! # Community Module
//!
//! Club membership tiers and forum access control.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       COMMUNITY MODULE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐            ┌─────────────────────┐                    │
//! │  │    Roles    │            │     Permissions     │                    │
//! │  │             │            │                     │                    │
//! │  │ - ClubRole  │──────────► │ - Owner bypass      │ ◄── ForumService   │
//! │  │ - Level     │  ordinals  │ - Ordinal compare   │     (enforcement)  │
//! │  │ - Parse     │            │ - Public read rule  │ ◄── UI gating      │
//! │  └─────────────┘            └─────────────────────┘                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod permissions;
mod roles;

pub use permissions::{ForumAccess, ForumAction, ForumLevels, PermissionEvaluator};
pub use roles::{role_ordinal, ClubRole, PermissionLevel};
