//! # Clubhouse Core
//!
//! Club forums with rename-proof `@username` mentions, mention-aware
//! search, and tiered forum permissions.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CLUBHOUSE CORE MODULES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │   Mention   │  │   Search    │  │  Community  │  │    Forum     │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Tokenize  │  │ - Condition │  │ - Roles     │  │ - Posts      │   │
//! │  │ - Render    │  │ - Builder   │  │ - Levels    │  │ - Enforce    │   │
//! │  │ - Tokens    │  │ - Guard     │  │ - Evaluator │  │ - Render     │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │   Profile   │  │  Directory  │ │ │           Storage               ││
//! │  │             │  │             │ │ │                                 ││
//! │  │ - ID        │  │ - Batched   │◄┘ │ - SQLite (rusqlite)            ││
//! │  │ - Username  │  │   lookups   │   │ - Mention relation             ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Mention charset and storage configuration
//! - [`profile`] - Profile identity types
//! - [`directory`] - Profile lookup collaborator
//! - [`mention`] - Mention tokenizer and renderer
//! - [`search`] - Search condition builder
//! - [`community`] - Club roles and forum permissions
//! - [`storage`] - SQLite storage
//! - [`forum`] - Forum service tying it all together

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod community;
pub mod config;
pub mod directory;
pub mod error;
pub mod forum;
pub mod mention;
pub mod profile;
pub mod search;
pub mod storage;
/// UTC time utilities.
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use community::{
    ClubRole, ForumAccess, ForumAction, ForumLevels, PermissionEvaluator, PermissionLevel,
};
pub use config::{CoreConfig, IdentifierCharset, MentionConfig};
pub use directory::{InMemoryDirectory, ProfileDirectory};
pub use error::{Error, Result};
pub use forum::{ForumService, RenderedPost};
pub use mention::{MentionRenderer, MentionTokenizer, Segment};
pub use profile::{Profile, ProfileId, ProfileRef};
pub use search::{Condition, SearchConditionBuilder, SearchConditions};
pub use storage::{ContentStore, Database};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Clubhouse Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
