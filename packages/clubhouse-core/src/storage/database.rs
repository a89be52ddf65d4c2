//! # Database
//!
//! SQLite-backed content store and profile directory.
//!
//! ## Database Operations
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DATABASE OPERATIONS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  ForumService   │                                                   │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    Database     │  High-level API                                   │
//! │  │   (this file)   │  - Profiles (ProfileDirectory)                    │
//! │  │                 │  - Clubs, members, forums                         │
//! │  │                 │  - Posts + mention relation (ContentStore)        │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    rusqlite     │  - In-memory for tests                            │
//! │  │                 │  - File for the CLI                               │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::schema;
use super::ContentStore;
use crate::community::{ClubRole, ForumLevels, PermissionLevel};
use crate::directory::ProfileDirectory;
use crate::error::{Error, Result};
use crate::mention::{is_token_safe_id, mentioned_ids};
use crate::profile::{Profile, ProfileId, ProfileRef};
use crate::search::Condition;

/// A club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubRecord {
    /// Club ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning profile
    pub owner_id: ProfileId,
    /// Creation timestamp
    pub created_at: i64,
}

/// A forum inside a club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumRecord {
    /// Forum ID
    pub id: String,
    /// Parent club
    pub club_id: String,
    /// Display name
    pub name: String,
    /// Read/write permission levels
    pub levels: ForumLevels,
}

/// A post. `content` is stored text (mentions tokenized).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Post ID
    pub id: String,
    /// Forum the post belongs to
    pub forum_id: String,
    /// Author profile
    pub author_id: ProfileId,
    /// Stored text
    pub content: String,
    /// Creation timestamp
    pub created_at: i64,
    /// Last edit timestamp
    pub updated_at: Option<i64>,
}

/// The main database handle
pub struct Database {
    /// The underlying SQLite connection
    conn: Mutex<Connection>,
}

const PROFILE_COLUMNS: &str = "id, username, full_name, avatar_url";
const POST_COLUMNS: &str = "id, forum_id, author_id, content, created_at, updated_at";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: ProfileId::new(row.get::<_, String>(0)?),
        username: row.get(1)?,
        full_name: row.get(2)?,
        avatar_url: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        forum_id: row.get(1)?,
        author_id: ProfileId::new(row.get::<_, String>(2)?),
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// SQL name of the Unicode lowercase function registered on every connection.
///
/// SQLite's own `lower()` and `LIKE` fold ASCII only; this applies Rust's
/// `str::to_lowercase` so SQL matching agrees with [`Condition::matches`]
/// and [`Profile::matches_text`].
const FOLD_CASE_FN: &str = "fold_case";

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )
}

fn write_post(conn: &Connection, post: &PostRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, forum_id, author_id, content, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            post.id,
            post.forum_id,
            post.author_id.as_str(),
            post.content,
            post.created_at,
            post.updated_at
        ],
    )?;
    Ok(())
}

fn write_post_content(conn: &Connection, id: &str, content: &str, now: i64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE posts SET content = ?, updated_at = ? WHERE id = ?",
        params![content, now, id],
    )?;
    if changed == 0 {
        return Err(Error::PostNotFound);
    }
    Ok(())
}

fn write_mentions(conn: &Connection, post_id: &str, profile_ids: &[ProfileId]) -> Result<()> {
    conn.execute("DELETE FROM post_mentions WHERE post_id = ?", params![post_id])?;
    for id in profile_ids {
        conn.execute(
            "INSERT OR IGNORE INTO post_mentions (post_id, profile_id) VALUES (?, ?)",
            params![post_id, id.as_str()],
        )?;
    }
    Ok(())
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl Database {
    /// Open or create a database
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::DatabaseError(format!("Failed to open database: {}", e)))?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        register_functions(&conn)?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let version: Option<i32> = {
            let conn = self.conn.lock();
            conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok()
        };

        match version {
            None => {
                let conn = self.conn.lock();
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::DatabaseError(format!("Failed to create tables: {}", e)))?;
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )?;

                tracing::info!("Database schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) if v < schema::SCHEMA_VERSION => {
                tracing::info!(
                    "Database schema version {} is older than current {}, running migrations",
                    v,
                    schema::SCHEMA_VERSION
                );

                if v < 2 {
                    tracing::info!("Running migration v1 → v2 (post mentions)");
                    self.conn
                        .lock()
                        .execute_batch(schema::MIGRATE_V1_TO_V2)
                        .map_err(|e| {
                            Error::DatabaseError(format!("Migration v1→v2 failed: {}", e))
                        })?;
                    let backfilled = self.backfill_post_mentions()?;
                    tracing::info!(posts = backfilled, "Backfilled post mentions");
                }

                self.conn.lock().execute(
                    "UPDATE schema_version SET version = ?",
                    params![schema::SCHEMA_VERSION],
                )?;
                tracing::info!(
                    "All migrations complete (now at version {})",
                    schema::SCHEMA_VERSION
                );
            }
            Some(v) => {
                tracing::debug!("Database schema version: {}", v);
            }
        }

        Ok(())
    }

    /// Current schema version.
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn.lock();
        Ok(conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })?)
    }

    fn backfill_post_mentions(&self) -> Result<usize> {
        let posts: Vec<(String, String)> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare("SELECT id, content FROM posts")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        let mut count = 0;
        for (post_id, content) in &posts {
            let ids = mentioned_ids(content);
            if !ids.is_empty() {
                self.replace_post_mentions(post_id, &ids)?;
                count += 1;
            }
        }
        Ok(count)
    }

    // ========================================================================
    // PROFILE OPERATIONS
    // ========================================================================

    /// Insert a profile. Fails with `Conflict` on duplicate ID or username
    /// and `InvalidProfileId` for IDs a mention token cannot carry.
    pub fn insert_profile(&self, profile: &Profile) -> Result<()> {
        if !is_token_safe_id(profile.id.as_str()) {
            return Err(Error::InvalidProfileId(profile.id.to_string()));
        }
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO profiles (id, username, full_name, avatar_url) VALUES (?, ?, ?, ?)",
            params![
                profile.id.as_str(),
                profile.username,
                profile.full_name,
                profile.avatar_url
            ],
        )?;
        Ok(())
    }

    /// Get a profile by ID
    pub fn get_profile(&self, id: &ProfileId) -> Result<Option<Profile>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS),
                params![id.as_str()],
                profile_from_row,
            )
            .optional()?)
    }

    /// Change a profile's username. Stored mentions are unaffected.
    pub fn rename_profile(&self, id: &ProfileId, new_username: &str) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE profiles SET username = ? WHERE id = ?",
            params![new_username, id.as_str()],
        )?;
        if changed == 0 {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a profile. Posts mentioning it render a placeholder afterwards.
    pub fn delete_profile(&self, id: &ProfileId) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM profiles WHERE id = ?", params![id.as_str()])?;
        Ok(changed > 0)
    }

    // ========================================================================
    // CLUB OPERATIONS
    // ========================================================================

    /// Create a club owned by `owner_id`.
    pub fn create_club(&self, id: &str, name: &str, owner_id: &ProfileId, now: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO clubs (id, name, owner_id, created_at) VALUES (?, ?, ?, ?)",
            params![id, name, owner_id.as_str(), now],
        )?;
        Ok(())
    }

    /// Get a club by ID
    pub fn get_club(&self, id: &str) -> Result<Option<ClubRecord>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT id, name, owner_id, created_at FROM clubs WHERE id = ?",
                params![id],
                |row| {
                    Ok(ClubRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        owner_id: ProfileId::new(row.get::<_, String>(2)?),
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    /// Add a member, or change the role of an existing one.
    pub fn upsert_club_member(
        &self,
        club_id: &str,
        profile_id: &ProfileId,
        role: ClubRole,
        now: i64,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO club_members (club_id, profile_id, role, joined_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(club_id, profile_id) DO UPDATE SET role = excluded.role",
            params![club_id, profile_id.as_str(), role.as_str(), now],
        )?;
        Ok(())
    }

    /// Remove a member from a club.
    pub fn remove_club_member(&self, club_id: &str, profile_id: &ProfileId) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "DELETE FROM club_members WHERE club_id = ? AND profile_id = ?",
            params![club_id, profile_id.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// A profile's role in a club.
    ///
    /// `None` for non-members and for unrecognized stored role values.
    pub fn get_member_role(
        &self,
        club_id: &str,
        profile_id: &ProfileId,
    ) -> Result<Option<ClubRole>> {
        let stored: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT role FROM club_members WHERE club_id = ? AND profile_id = ?",
                params![club_id, profile_id.as_str()],
                |row| row.get(0),
            )
            .optional()?
        };
        Ok(stored.and_then(|s| {
            let role = ClubRole::parse(&s);
            if role.is_none() {
                tracing::warn!(
                    club_id,
                    value = s.as_str(),
                    "Unrecognized club role, treating as non-member"
                );
            }
            role
        }))
    }

    // ========================================================================
    // FORUM OPERATIONS
    // ========================================================================

    /// Create a forum in a club.
    pub fn create_forum(
        &self,
        id: &str,
        club_id: &str,
        name: &str,
        levels: ForumLevels,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO forums (id, club_id, name, read_permission, write_permission)
             VALUES (?, ?, ?, ?, ?)",
            params![id, club_id, name, levels.read.as_str(), levels.write.as_str()],
        )?;
        Ok(())
    }

    /// Change a forum's permission levels.
    pub fn update_forum_levels(&self, id: &str, levels: ForumLevels) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE forums SET read_permission = ?, write_permission = ? WHERE id = ?",
            params![levels.read.as_str(), levels.write.as_str(), id],
        )?;
        if changed == 0 {
            return Err(Error::ForumNotFound);
        }
        Ok(())
    }

    /// Get a forum by ID. Unknown stored levels read as leader-only.
    pub fn get_forum(&self, id: &str) -> Result<Option<ForumRecord>> {
        let conn = self.conn.lock();
        let row: Option<(String, String, String, String, String)> = conn
            .query_row(
                "SELECT id, club_id, name, read_permission, write_permission
                 FROM forums WHERE id = ?",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;
        Ok(row.map(|(id, club_id, name, read, write)| ForumRecord {
            id,
            club_id,
            name,
            levels: ForumLevels {
                read: PermissionLevel::parse_or_strictest(&read),
                write: PermissionLevel::parse_or_strictest(&write),
            },
        }))
    }

    // ========================================================================
    // POST OPERATIONS
    // ========================================================================

    /// Insert a post.
    pub fn insert_post(&self, post: &PostRecord) -> Result<()> {
        write_post(&self.conn.lock(), post)
    }

    /// Insert a post and its mention relation in one transaction.
    pub fn insert_post_with_mentions(
        &self,
        post: &PostRecord,
        mentioned: &[ProfileId],
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        write_post(&tx, post)?;
        write_mentions(&tx, &post.id, mentioned)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace a post's stored text and mention relation in one transaction.
    pub fn update_post_with_mentions(
        &self,
        id: &str,
        content: &str,
        now: i64,
        mentioned: &[ProfileId],
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        write_post_content(&tx, id, content, now)?;
        write_mentions(&tx, id, mentioned)?;
        tx.commit()?;
        Ok(())
    }

    /// Get a post by ID
    pub fn get_post(&self, id: &str) -> Result<Option<PostRecord>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS),
                params![id],
                post_from_row,
            )
            .optional()?)
    }

    /// All posts in a forum, newest first.
    pub fn list_posts(&self, forum_id: &str) -> Result<Vec<PostRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts WHERE forum_id = ? ORDER BY created_at DESC, rowid DESC",
            POST_COLUMNS
        ))?;
        let rows = stmt.query_map(params![forum_id], post_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Posts in a forum matching any of `conditions`, newest first.
    ///
    /// An empty condition list matches nothing. Text conditions fold case
    /// the same way [`Condition::matches`] does.
    pub fn query_posts(
        &self,
        forum_id: &str,
        conditions: &[Condition],
    ) -> Result<Vec<PostRecord>> {
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<&str> = Vec::with_capacity(conditions.len());
        let mut args: Vec<String> = vec![forum_id.to_string()];
        for condition in conditions {
            match condition {
                Condition::MentionsProfile(_) => {
                    clauses.push("instr(content, ?) > 0");
                    args.push(condition.needle());
                }
                Condition::ContainsText(text) => {
                    clauses.push("instr(fold_case(content), ?) > 0");
                    args.push(text.to_lowercase());
                }
            }
        }

        let sql = format!(
            "SELECT {} FROM posts WHERE forum_id = ? AND ({})
             ORDER BY created_at DESC, rowid DESC",
            POST_COLUMNS,
            clauses.join(" OR ")
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), post_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ========================================================================
    // MENTION RELATION
    // ========================================================================

    /// Replace the set of profiles a post mentions.
    pub fn replace_post_mentions(&self, post_id: &str, profile_ids: &[ProfileId]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        write_mentions(&tx, post_id, profile_ids)?;
        tx.commit()?;
        Ok(())
    }

    /// Profiles a post mentions.
    pub fn post_mentions(&self, post_id: &str) -> Result<Vec<ProfileId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT profile_id FROM post_mentions WHERE post_id = ? ORDER BY profile_id",
        )?;
        let rows = stmt.query_map(params![post_id], |row| {
            Ok(ProfileId::new(row.get::<_, String>(0)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// IDs of posts mentioning a profile.
    pub fn posts_mentioning(&self, profile_id: &ProfileId) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT post_id FROM post_mentions WHERE profile_id = ? ORDER BY post_id",
        )?;
        let rows = stmt.query_map(params![profile_id.as_str()], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}

#[async_trait]
impl ProfileDirectory for Database {
    async fn profiles_by_usernames(&self, usernames: &[String]) -> Result<Vec<ProfileRef>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, username FROM profiles WHERE username IN ({})",
            placeholders(usernames.len())
        ))?;
        let rows = stmt.query_map(params_from_iter(usernames.iter()), |row| {
            Ok(ProfileRef {
                id: ProfileId::new(row.get::<_, String>(0)?),
                username: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    async fn profiles_by_ids(&self, ids: &[ProfileId]) -> Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles WHERE id IN ({})",
            PROFILE_COLUMNS,
            placeholders(ids.len())
        ))?;
        let rows = stmt.query_map(
            params_from_iter(ids.iter().map(ProfileId::as_str)),
            profile_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    async fn search_profiles(&self, query: &str) -> Result<Vec<Profile>> {
        let needle = query.to_lowercase();
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles
             WHERE instr(fold_case(username), ?1) > 0 OR instr(fold_case(full_name), ?1) > 0
             ORDER BY username",
            PROFILE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![needle], profile_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}

#[async_trait]
impl ContentStore for Database {
    async fn find_posts(
        &self,
        forum_id: &str,
        conditions: &[Condition],
    ) -> Result<Vec<PostRecord>> {
        self.query_posts(forum_id, conditions)
    }
}
