//! # Forum Service
//!
//! Ties the mention pipeline, search, and permission evaluator to storage.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          FORUM SERVICE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  create_post / edit_post                                                │
//! │     access.require(Write) ─► tokenize ─► posts + post_mentions          │
//! │                                                                         │
//! │  list_posts / search_posts                                              │
//! │     access.require(Read) ─► [conditions ─► find_posts]                  │
//! │                          ─► render_batch (one profile lookup)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::community::{ClubRole, ForumAccess, ForumAction, ForumLevels};
use crate::config::MentionConfig;
use crate::error::{Error, Result};
use crate::mention::{segments_to_editable_text, MentionRenderer, MentionTokenizer, Segment};
use crate::profile::ProfileId;
use crate::search::{SearchConditionBuilder, SearchConditions};
use crate::storage::{ClubRecord, ContentStore, Database, ForumRecord, PostRecord};

/// A post ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPost {
    /// The stored post
    pub post: PostRecord,
    /// Display segments
    pub segments: Vec<Segment>,
}

/// Clubs, forums and posts on top of a [`Database`].
pub struct ForumService {
    db: Arc<Database>,
    tokenizer: MentionTokenizer,
    renderer: MentionRenderer,
}

impl ForumService {
    /// Create a new forum service backed by the given database.
    pub fn new(db: Arc<Database>, config: &MentionConfig) -> Self {
        Self {
            db,
            tokenizer: MentionTokenizer::new(config),
            renderer: MentionRenderer::new(),
        }
    }

    /// Get a reference to the underlying database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ========================================================================
    // CLUBS & FORUMS
    // ========================================================================

    /// Create a club owned by `owner_id`.
    pub fn create_club(&self, name: &str, owner_id: &ProfileId) -> Result<ClubRecord> {
        let club = ClubRecord {
            id: generate_id(),
            name: name.to_string(),
            owner_id: owner_id.clone(),
            created_at: crate::time::now_timestamp(),
        };
        self.db
            .create_club(&club.id, &club.name, &club.owner_id, club.created_at)?;
        tracing::info!(club_id = club.id.as_str(), "Club created");
        Ok(club)
    }

    /// Add a member or change their role.
    pub fn set_member_role(
        &self,
        club_id: &str,
        profile_id: &ProfileId,
        role: ClubRole,
    ) -> Result<()> {
        self.club(club_id)?;
        self.db
            .upsert_club_member(club_id, profile_id, role, crate::time::now_timestamp())
    }

    /// Create a forum in a club.
    pub fn create_forum(
        &self,
        club_id: &str,
        name: &str,
        levels: ForumLevels,
    ) -> Result<ForumRecord> {
        self.club(club_id)?;
        let forum = ForumRecord {
            id: generate_id(),
            club_id: club_id.to_string(),
            name: name.to_string(),
            levels,
        };
        self.db
            .create_forum(&forum.id, &forum.club_id, &forum.name, forum.levels)?;
        Ok(forum)
    }

    fn club(&self, club_id: &str) -> Result<ClubRecord> {
        self.db.get_club(club_id)?.ok_or(Error::ClubNotFound)
    }

    fn forum(&self, forum_id: &str) -> Result<ForumRecord> {
        self.db.get_forum(forum_id)?.ok_or(Error::ForumNotFound)
    }

    // ========================================================================
    // ACCESS
    // ========================================================================

    /// What `viewer` is within a club. `None` is an anonymous viewer.
    pub fn viewer_access(&self, club_id: &str, viewer: Option<&ProfileId>) -> Result<ForumAccess> {
        let club = self.club(club_id)?;
        let Some(viewer) = viewer else {
            return Ok(ForumAccess::anonymous());
        };
        let role = self.db.get_member_role(club_id, viewer)?;
        Ok(ForumAccess {
            role,
            is_owner: club.owner_id == *viewer,
        })
    }

    /// Resolve a forum and check `action` for `viewer` against it.
    fn authorize(
        &self,
        forum_id: &str,
        viewer: Option<&ProfileId>,
        action: ForumAction,
    ) -> Result<ForumRecord> {
        let forum = self.forum(forum_id)?;
        let access = self.viewer_access(&forum.club_id, viewer)?;
        access.require(action, &forum.levels)?;
        Ok(forum)
    }

    // ========================================================================
    // POSTS
    // ========================================================================

    /// Tokenize and save a new post.
    ///
    /// If the profile lookup fails the post is saved with its text
    /// unchanged.
    pub async fn create_post(
        &self,
        forum_id: &str,
        author_id: &ProfileId,
        raw_text: &str,
    ) -> Result<PostRecord> {
        validate_content(raw_text)?;
        self.authorize(forum_id, Some(author_id), ForumAction::Write)?;

        let outcome = self
            .tokenizer
            .tokenize_with_mentions(raw_text, self.db.as_ref())
            .await;

        let post = PostRecord {
            id: generate_id(),
            forum_id: forum_id.to_string(),
            author_id: author_id.clone(),
            content: outcome.text,
            created_at: crate::time::now_timestamp(),
            updated_at: None,
        };
        self.db.insert_post_with_mentions(&post, &outcome.mentioned)?;

        tracing::info!(
            post_id = post.id.as_str(),
            mentions = outcome.mentioned.len(),
            "Post created"
        );
        Ok(post)
    }

    /// Replace a post's text. Only the author may edit.
    pub async fn edit_post(
        &self,
        post_id: &str,
        editor_id: &ProfileId,
        raw_text: &str,
    ) -> Result<PostRecord> {
        validate_content(raw_text)?;
        let mut post = self.db.get_post(post_id)?.ok_or(Error::PostNotFound)?;
        if post.author_id != *editor_id {
            return Err(Error::NotAuthor);
        }
        self.authorize(&post.forum_id, Some(editor_id), ForumAction::Write)?;

        let outcome = self
            .tokenizer
            .tokenize_with_mentions(raw_text, self.db.as_ref())
            .await;
        let now = crate::time::now_timestamp();
        self.db
            .update_post_with_mentions(post_id, &outcome.text, now, &outcome.mentioned)?;

        post.content = outcome.text;
        post.updated_at = Some(now);
        Ok(post)
    }

    /// Text to pre-fill an editor with. Mentions show current usernames;
    /// unresolved ones keep their token.
    pub async fn editable_text(&self, post_id: &str, viewer: Option<&ProfileId>) -> Result<String> {
        let post = self.db.get_post(post_id)?.ok_or(Error::PostNotFound)?;
        self.authorize(&post.forum_id, viewer, ForumAction::Read)?;
        let mut rendered = self
            .renderer
            .render_batch(&[post.content.as_str()], self.db.as_ref(), None)
            .await;
        Ok(rendered
            .pop()
            .map(|segments| segments_to_editable_text(&segments))
            .unwrap_or_default())
    }

    /// All posts in a forum, newest first, rendered.
    pub async fn list_posts(
        &self,
        forum_id: &str,
        viewer: Option<&ProfileId>,
    ) -> Result<Vec<RenderedPost>> {
        self.authorize(forum_id, viewer, ForumAction::Read)?;
        let posts = self.db.list_posts(forum_id)?;
        Ok(self.render_posts(posts, None).await)
    }

    /// Posts matching a free-text query, newest first, rendered with the
    /// query highlighted.
    pub async fn search_posts(
        &self,
        forum_id: &str,
        viewer: Option<&ProfileId>,
        query: &str,
    ) -> Result<Vec<RenderedPost>> {
        self.authorize(forum_id, viewer, ForumAction::Read)?;

        let conditions = SearchConditionBuilder::build(query, self.db.as_ref()).await;
        let posts = match &conditions {
            SearchConditions::Empty => return Ok(Vec::new()),
            SearchConditions::Any(c) => self.db.find_posts(forum_id, c).await?,
        };
        tracing::debug!(forum_id, results = posts.len(), "Forum search");
        Ok(self.render_posts(posts, Some(query)).await)
    }

    async fn render_posts(
        &self,
        posts: Vec<PostRecord>,
        highlight: Option<&str>,
    ) -> Vec<RenderedPost> {
        let texts: Vec<&str> = posts.iter().map(|p| p.content.as_str()).collect();
        let rendered = self
            .renderer
            .render_batch(&texts, self.db.as_ref(), highlight)
            .await;
        posts
            .into_iter()
            .zip(rendered)
            .map(|(post, segments)| RenderedPost { post, segments })
            .collect()
    }
}

fn validate_content(raw_text: &str) -> Result<()> {
    if raw_text.trim().is_empty() {
        return Err(Error::InvalidContent("post text is empty".into()));
    }
    Ok(())
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::PermissionLevel;
    use crate::mention::segments_to_display_text;
    use crate::profile::Profile;

    struct Fixture {
        service: ForumService,
        forum: ForumRecord,
        owner: ProfileId,
        general: ProfileId,
        full: ProfileId,
    }

    fn fixture(levels: ForumLevels) -> Fixture {
        let db = Arc::new(Database::open(None).unwrap());
        db.insert_profile(&Profile::new("u-owner", "olivia", "Olivia Han")).unwrap();
        db.insert_profile(&Profile::new("u-gen", "gus", "Gus Yoon")).unwrap();
        db.insert_profile(&Profile::new("u-full", "alice", "Alice Kim")).unwrap();

        let service = ForumService::new(db, &MentionConfig::default());
        let owner = ProfileId::new("u-owner");
        let general = ProfileId::new("u-gen");
        let full = ProfileId::new("u-full");

        let club = service.create_club("Runners", &owner).unwrap();
        service.set_member_role(&club.id, &general, ClubRole::GeneralMember).unwrap();
        service.set_member_role(&club.id, &full, ClubRole::FullMember).unwrap();
        let forum = service.create_forum(&club.id, "General", levels).unwrap();

        Fixture {
            service,
            forum,
            owner,
            general,
            full,
        }
    }

    fn open_forum() -> ForumLevels {
        ForumLevels {
            read: PermissionLevel::Public,
            write: PermissionLevel::Member,
        }
    }

    #[tokio::test]
    async fn test_create_post_tokenizes_and_records_mentions() {
        let f = fixture(open_forum());
        let post = f
            .service
            .create_post(&f.forum.id, &f.general, "hi @alice and @nobody")
            .await
            .unwrap();

        assert_eq!(post.content, "hi [mention:u-full] and @nobody");
        assert_eq!(f.service.db().post_mentions(&post.id).unwrap(), vec![f.full.clone()]);
    }

    #[tokio::test]
    async fn test_write_denied_below_level() {
        let f = fixture(ForumLevels {
            read: PermissionLevel::Public,
            write: PermissionLevel::FullMember,
        });
        let err = f
            .service
            .create_post(&f.forum.id, &f.general, "hello")
            .await
            .unwrap_err();
        assert!(err.is_access_error());

        // Owner bypass applies even without a membership row
        assert!(f.service.create_post(&f.forum.id, &f.owner, "hello").await.is_ok());
        assert!(f.service.create_post(&f.forum.id, &f.full, "hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_anonymous_read_only_on_public() {
        let f = fixture(open_forum());
        f.service.create_post(&f.forum.id, &f.general, "hello").await.unwrap();
        assert_eq!(f.service.list_posts(&f.forum.id, None).await.unwrap().len(), 1);

        let members_only = f
            .service
            .create_forum(&f.forum.club_id, "Members", ForumLevels::default())
            .unwrap();
        assert!(f.service.list_posts(&members_only.id, None).await.is_err());
    }

    #[tokio::test]
    async fn test_only_author_can_edit() {
        let f = fixture(open_forum());
        let post = f.service.create_post(&f.forum.id, &f.general, "hi").await.unwrap();
        let err = f.service.edit_post(&post.id, &f.full, "hijack").await.unwrap_err();
        assert!(matches!(err, Error::NotAuthor));

        let edited = f
            .service
            .edit_post(&post.id, &f.general, "hi @olivia")
            .await
            .unwrap();
        assert_eq!(edited.content, "hi [mention:u-owner]");
        assert!(edited.updated_at.is_some());
        assert_eq!(f.service.db().post_mentions(&post.id).unwrap(), vec![f.owner.clone()]);
    }

    #[tokio::test]
    async fn test_rendering_follows_rename() {
        let f = fixture(open_forum());
        f.service.create_post(&f.forum.id, &f.general, "cc @alice").await.unwrap();
        f.service.db().rename_profile(&f.full, "alicia").unwrap();

        let posts = f.service.list_posts(&f.forum.id, Some(&f.general)).await.unwrap();
        assert_eq!(segments_to_display_text(&posts[0].segments), "cc @alicia");
    }

    #[tokio::test]
    async fn test_editable_text_uses_current_usernames() {
        let f = fixture(open_forum());
        let post = f.service.create_post(&f.forum.id, &f.general, "cc @alice").await.unwrap();
        f.service.db().rename_profile(&f.full, "alicia").unwrap();
        assert_eq!(
            f.service.editable_text(&post.id, Some(&f.general)).await.unwrap(),
            "cc @alicia"
        );
    }

    #[tokio::test]
    async fn test_search_by_username_finds_mentions() {
        let f = fixture(open_forum());
        f.service.create_post(&f.forum.id, &f.general, "thanks @alice").await.unwrap();
        f.service.create_post(&f.forum.id, &f.general, "unrelated").await.unwrap();

        let results = f
            .service
            .search_posts(&f.forum.id, Some(&f.general), "alice")
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0]
            .segments
            .iter()
            .any(|s| matches!(s, Segment::Mention { username, .. } if username == "alice")));
    }

    #[tokio::test]
    async fn test_structural_search_is_empty() {
        let f = fixture(open_forum());
        f.service.create_post(&f.forum.id, &f.general, "thanks @alice").await.unwrap();
        assert!(f
            .service
            .search_posts(&f.forum.id, None, "mention")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_empty_post_rejected() {
        let f = fixture(open_forum());
        let err = f.service.create_post(&f.forum.id, &f.general, "  ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidContent(_)));
    }

    #[test]
    fn test_viewer_access() {
        let f = fixture(open_forum());
        let club_id = f.forum.club_id.as_str();
        assert_eq!(f.service.viewer_access(club_id, None).unwrap(), ForumAccess::anonymous());
        assert_eq!(
            f.service.viewer_access(club_id, Some(&f.general)).unwrap(),
            ForumAccess::member(ClubRole::GeneralMember)
        );
        assert_eq!(
            f.service.viewer_access(club_id, Some(&f.owner)).unwrap(),
            ForumAccess::owner(None)
        );
        assert!(matches!(
            f.service.viewer_access("missing", None),
            Err(Error::ClubNotFound)
        ));
    }
}
