//! # Search Conditions
//!
//! Builds the filter a content store applies for a free-text search.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CONDITION BUILDING                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  query ──► search_profiles(query)  (one lookup)                        │
//! │              │                                                          │
//! │              ├── 1+ profiles ──► Any[ Mentions(id)…, Contains(query) ] │
//! │              │                                                          │
//! │              └── 0 profiles                                            │
//! │                    ├── "mention" or UUID-shaped ──► Empty              │
//! │                    └── otherwise ──────────────► Any[ Contains(query) ]│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conditions are OR-combined by the store. A query that looks like token
//! syntax returns `Empty` instead of a broad substring scan over token text.

use serde::{Deserialize, Serialize};

use crate::directory::ProfileDirectory;
use crate::mention::{format_token, looks_like_uuid, MENTION_KEYWORD};
use crate::profile::ProfileId;

/// One OR-able predicate over stored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Condition {
    /// Content contains a mention token for this profile
    MentionsProfile(ProfileId),
    /// Content contains this text, case-insensitively
    ContainsText(String),
}

impl Condition {
    /// The literal substring this condition looks for.
    pub fn needle(&self) -> String {
        match self {
            Condition::MentionsProfile(id) => format_token(id),
            Condition::ContainsText(text) => text.clone(),
        }
    }

    /// Evaluate against a stored text.
    pub fn matches(&self, stored_text: &str) -> bool {
        match self {
            Condition::MentionsProfile(id) => stored_text.contains(&format_token(id)),
            Condition::ContainsText(text) => {
                stored_text.to_lowercase().contains(&text.to_lowercase())
            }
        }
    }
}

/// Result of building conditions for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "conditions", rename_all = "snake_case")]
pub enum SearchConditions {
    /// Match content satisfying any of these conditions
    Any(Vec<Condition>),
    /// Match nothing
    Empty,
}

impl SearchConditions {
    /// Whether this is the explicit empty marker.
    pub fn is_empty(&self) -> bool {
        matches!(self, SearchConditions::Empty)
    }

    /// The conditions, or an empty slice for `Empty`.
    pub fn conditions(&self) -> &[Condition] {
        match self {
            SearchConditions::Any(c) => c,
            SearchConditions::Empty => &[],
        }
    }

    /// Evaluate against a stored text.
    pub fn matches(&self, stored_text: &str) -> bool {
        self.conditions().iter().any(|c| c.matches(stored_text))
    }
}

/// Whether a query is internal token syntax rather than user text.
pub fn is_structural_query(query: &str) -> bool {
    let q = query.trim();
    q.eq_ignore_ascii_case(MENTION_KEYWORD) || looks_like_uuid(q)
}

/// Builds [`SearchConditions`] for free-text queries.
pub struct SearchConditionBuilder;

impl SearchConditionBuilder {
    /// Build the condition set for `query`.
    ///
    /// A blank query yields `Empty`. If the profile lookup fails the query
    /// is treated as matching no profiles.
    pub async fn build(query: &str, directory: &dyn ProfileDirectory) -> SearchConditions {
        let query = query.trim();
        if query.is_empty() {
            return SearchConditions::Empty;
        }

        let profiles = match directory.search_profiles(query).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Profile search failed, using text match only");
                Vec::new()
            }
        };

        if profiles.is_empty() {
            if is_structural_query(query) {
                tracing::debug!(query, "Structural search query, returning empty marker");
                return SearchConditions::Empty;
            }
            return SearchConditions::Any(vec![Condition::ContainsText(query.to_string())]);
        }

        tracing::debug!(query, profiles = profiles.len(), "Search matched profiles");

        let mut conditions: Vec<Condition> = Vec::with_capacity(profiles.len() + 1);
        for profile in profiles {
            let condition = Condition::MentionsProfile(profile.id);
            if !conditions.contains(&condition) {
                conditions.push(condition);
            }
        }
        conditions.push(Condition::ContainsText(query.to_string()));
        SearchConditions::Any(conditions)
    }
}
