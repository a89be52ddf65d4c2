//! # Mention Renderer
//!
//! Turns stored text back into display segments.
//!
//! ```text
//! "hi [mention:u1], see [mention:gone]"
//!        │
//!        ▼  split on tokens
//! [Text("hi ")] [Mention u1 → @alice] [Text(", see ")] [MissingMention gone]
//! ```
//!
//! Rendering never mutates stored content and never fails. An ID without a
//! profile (deleted account) becomes a placeholder segment.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::token::{format_token, mentioned_ids_in, TOKEN_REGEX};
use crate::directory::ProfileDirectory;
use crate::profile::{Profile, ProfileId};

/// Label shown for a mention whose profile no longer resolves.
pub const MISSING_MENTION_LABEL: &str = "unknown user";

/// One displayable run of rendered content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// Text matching the search query (emphasized in the UI)
    Highlight {
        /// The matched text, original casing preserved
        text: String,
    },
    /// Link to a resolved profile
    Mention {
        /// Profile ID
        id: ProfileId,
        /// Current username
        username: String,
    },
    /// Placeholder link for a profile that no longer resolves
    MissingMention {
        /// Profile ID from the token
        id: ProfileId,
    },
}

impl Segment {
    fn text(s: &str) -> Self {
        Segment::Text { text: s.to_string() }
    }

    /// What the segment displays.
    pub fn display_text(&self) -> String {
        match self {
            Segment::Text { text } | Segment::Highlight { text } => text.clone(),
            Segment::Mention { username, .. } => format!("@{}", username),
            Segment::MissingMention { .. } => format!("@{}", MISSING_MENTION_LABEL),
        }
    }
}

/// Plain display string for a segment sequence.
pub fn segments_to_display_text(segments: &[Segment]) -> String {
    segments.iter().map(Segment::display_text).collect()
}

/// Editable raw text for a segment sequence.
///
/// Resolved mentions become `@username` so re-saving re-tokenizes them to
/// the same ID. Missing mentions keep their original token so the reference
/// survives an edit.
pub fn segments_to_editable_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::MissingMention { id } => format_token(id),
            other => other.display_text(),
        })
        .collect()
}

/// Renders stored text into segments.
#[derive(Debug, Clone, Default)]
pub struct MentionRenderer;

impl MentionRenderer {
    /// Create a renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render one stored text against already-resolved profiles.
    ///
    /// A non-blank `highlight` query splits text runs into `Text` and
    /// `Highlight` segments, matched case-insensitively.
    pub fn render(
        &self,
        stored_text: &str,
        profiles_by_id: &HashMap<ProfileId, Profile>,
        highlight: Option<&str>,
    ) -> Vec<Segment> {
        let highlighter = highlight.and_then(highlight_regex);
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in TOKEN_REGEX.captures_iter(stored_text) {
            let Some(whole) = caps.get(0) else { continue };
            push_text(&mut segments, &stored_text[last..whole.start()], highlighter.as_ref());

            let id = ProfileId::new(&caps[1]);
            match profiles_by_id.get(&id) {
                Some(profile) => segments.push(Segment::Mention {
                    id,
                    username: profile.username.clone(),
                }),
                None => segments.push(Segment::MissingMention { id }),
            }
            last = whole.end();
        }
        push_text(&mut segments, &stored_text[last..], highlighter.as_ref());

        segments
    }

    /// Render many stored texts with a single batched profile lookup.
    ///
    /// If the lookup fails every mention renders as a placeholder.
    pub async fn render_batch(
        &self,
        stored_texts: &[&str],
        directory: &dyn ProfileDirectory,
        highlight: Option<&str>,
    ) -> Vec<Vec<Segment>> {
        let profiles = resolve_mentioned_profiles(stored_texts.iter().copied(), directory).await;
        stored_texts
            .iter()
            .map(|text| self.render(text, &profiles, highlight))
            .collect()
    }
}

/// Resolve every profile mentioned across `stored_texts` in one lookup.
///
/// Returns an empty map without any lookup when nothing is mentioned, and
/// on lookup failure.
pub async fn resolve_mentioned_profiles<'a>(
    stored_texts: impl IntoIterator<Item = &'a str>,
    directory: &dyn ProfileDirectory,
) -> HashMap<ProfileId, Profile> {
    let ids = mentioned_ids_in(stored_texts);
    if ids.is_empty() {
        return HashMap::new();
    }

    tracing::debug!(count = ids.len(), "Resolving mentioned profiles");

    match directory.profiles_by_ids(&ids).await {
        Ok(profiles) => profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Mentioned profile lookup failed, rendering placeholders");
            HashMap::new()
        }
    }
}

fn highlight_regex(query: &str) -> Option<Regex> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

fn push_text(segments: &mut Vec<Segment>, text: &str, highlighter: Option<&Regex>) {
    if text.is_empty() {
        return;
    }
    let Some(re) = highlighter else {
        segments.push(Segment::text(text));
        return;
    };

    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::text(&text[last..m.start()]));
        }
        segments.push(Segment::Highlight {
            text: m.as_str().to_string(),
        });
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::text(&text[last..]));
    }
}
