//! # Storage Module
//!
//! Local SQLite storage for Clubhouse data.
//!
//! ## Storage Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite Database                                                │   │
//! │  │  ───────────────                                                │   │
//! │  │                                                                 │   │
//! │  │  Tables:                                                       │   │
//! │  │  • profiles - ID, unique username, full name                   │   │
//! │  │  • clubs / club_members - ownership and role tiers            │   │
//! │  │  • forums - read/write permission levels                       │   │
//! │  │  • posts - stored text with mention tokens                     │   │
//! │  │  • post_mentions - explicit mention relation                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Seams:                                                                 │
//! │  • ProfileDirectory - batched profile lookups                          │
//! │  • ContentStore - condition-filtered post queries                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod database;
mod schema;

pub use database::{ClubRecord, Database, ForumRecord, PostRecord};
pub use schema::SCHEMA_VERSION;

use async_trait::async_trait;

use crate::config::CoreConfig;
use crate::error::Result;
use crate::search::Condition;

/// Content store collaborator: evaluates search conditions.
///
/// Conditions are OR-combined. An empty slice matches nothing.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Posts in `forum_id` matching any of `conditions`, newest first.
    async fn find_posts(&self, forum_id: &str, conditions: &[Condition]) -> Result<Vec<PostRecord>>;
}

/// Open the database named by `config`, in memory when no path is set.
pub fn init(config: &CoreConfig) -> Result<Database> {
    Database::open(config.database_path.as_deref())
}
