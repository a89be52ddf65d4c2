//! # Mention Module
//!
//! Rename-proof `@username` mentions for user-authored content.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         MENTION PIPELINE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   SAVE                                   DISPLAY                        │
//! │                                                                         │
//! │   raw text ("hi @alice")                 stored text                    │
//! │        │                                      │                         │
//! │        ▼                                      ▼                         │
//! │  ┌─────────────┐   profiles_by_usernames ┌─────────────┐ profiles_by_ids│
//! │  │  Tokenizer  │◄──────────────────────  │  Renderer   │◄────────────── │
//! │  └──────┬──────┘     (one batch)         └──────┬──────┘  (one batch)   │
//! │         │                                       │                       │
//! │         ▼                                       ▼                       │
//! │  stored text ("hi [mention:u1]")         [Text "hi "] [Mention @alice]  │
//! │         │                                                               │
//! │         └──► mention relation (post_id, profile_id)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored text only ever carries IDs, so a username change is picked up the
//! next time the content is rendered.

mod renderer;
mod token;
mod tokenizer;

pub use renderer::{
    resolve_mentioned_profiles, segments_to_display_text, segments_to_editable_text,
    MentionRenderer, Segment, MISSING_MENTION_LABEL,
};
pub use token::{
    format_token, is_token_safe_id, looks_like_uuid, mentioned_ids, mentioned_ids_in,
    MENTION_KEYWORD, TOKEN_PREFIX, TOKEN_SUFFIX,
};
pub use tokenizer::{MentionTokenizer, TokenizeOutcome};
