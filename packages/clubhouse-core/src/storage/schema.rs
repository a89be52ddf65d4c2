//! # Database Schema
//!
//! SQL schema definitions for the Clubhouse database.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DATABASE SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐    ┌─────────────────┐      ┌─────────────────┐    │
//! │  │    profiles     │    │      clubs      │      │  club_members   │    │
//! │  ├─────────────────┤    ├─────────────────┤      ├─────────────────┤    │
//! │  │ id              │◄───│ owner_id        │      │ club_id         │    │
//! │  │ username        │    │ id              │◄─────│ profile_id      │    │
//! │  │ full_name       │    │ name            │      │ role            │    │
//! │  │ avatar_url      │    │ created_at      │      │ joined_at       │    │
//! │  └─────────────────┘    └─────────────────┘      └─────────────────┘    │
//! │                                                                         │
//! │  ┌─────────────────┐    ┌─────────────────┐      ┌─────────────────┐    │
//! │  │     forums      │    │      posts      │      │  post_mentions  │    │
//! │  ├─────────────────┤    ├─────────────────┤      ├─────────────────┤    │
//! │  │ id              │◄───│ forum_id        │      │ post_id         │    │
//! │  │ club_id         │    │ id              │◄─────│ profile_id      │    │
//! │  │ name            │    │ author_id       │      └─────────────────┘    │
//! │  │ read_permission │    │ content         │                             │
//! │  │ write_permission│    │ created_at      │                             │
//! │  └─────────────────┘    │ updated_at      │                             │
//! │                         └─────────────────┘                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `posts.content` holds stored text with `[mention:<id>]` tokens;
//! `post_mentions` is the explicit relation kept alongside it.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Profiles: id is immutable, username is unique but may change
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL DEFAULT '',
    avatar_url TEXT
);

-- Clubs: exactly one owner
CREATE TABLE IF NOT EXISTS clubs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- Club membership with ordinal role
-- role: 'general_member' | 'full_member' | 'leader'
CREATE TABLE IF NOT EXISTS club_members (
    club_id TEXT NOT NULL,
    profile_id TEXT NOT NULL,
    role TEXT NOT NULL,
    joined_at INTEGER NOT NULL,
    PRIMARY KEY (club_id, profile_id)
);

-- Forums with independent read/write levels
-- levels: 'public' | 'member' | 'full_member' | 'leader'
CREATE TABLE IF NOT EXISTS forums (
    id TEXT PRIMARY KEY,
    club_id TEXT NOT NULL,
    name TEXT NOT NULL,
    read_permission TEXT NOT NULL DEFAULT 'member',
    write_permission TEXT NOT NULL DEFAULT 'member'
);

CREATE INDEX IF NOT EXISTS idx_forums_club ON forums(club_id);

-- Posts (stored text, mentions tokenized)
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    forum_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_posts_forum ON posts(forum_id, created_at);

-- Mention relation, refreshed on every save
CREATE TABLE IF NOT EXISTS post_mentions (
    post_id TEXT NOT NULL,
    profile_id TEXT NOT NULL,
    PRIMARY KEY (post_id, profile_id)
);

CREATE INDEX IF NOT EXISTS idx_post_mentions_profile ON post_mentions(profile_id);
"#;

/// Migration from v1 to v2: explicit mention relation.
///
/// Rows are backfilled from the tokens already in `posts.content`.
pub const MIGRATE_V1_TO_V2: &str = r#"
CREATE TABLE IF NOT EXISTS post_mentions (
    post_id TEXT NOT NULL,
    profile_id TEXT NOT NULL,
    PRIMARY KEY (post_id, profile_id)
);

CREATE INDEX IF NOT EXISTS idx_post_mentions_profile ON post_mentions(profile_id);
"#;
