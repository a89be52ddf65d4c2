//! # Mention Tokenizer
//!
//! Turns what an author typed into the canonical stored form.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         TOKENIZE FLOW                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  "hello @jay how are you?"                                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  1. Scan @<identifier chars>+   ──►  {"jay"}                            │
//! │        │ (none found: return text as-is, no lookup)                    │
//! │        ▼                                                                │
//! │  2. ONE batched lookup          ──►  {"jay" → u1}                       │
//! │        │ (lookup error: return text as-is)                             │
//! │        ▼                                                                │
//! │  3. Replace resolved names      ──►  "hello [mention:u1] how are you?"  │
//! │     (unresolved names stay literal)                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each match is the longest run of identifier characters after `@`, so a
//! replacement can never land in front of another identifier character.
//! That is the boundary rule: `@ann` never matches inside `@anna`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::token::{format_token, is_token_safe_id};
use crate::config::{IdentifierCharset, MentionConfig};
use crate::directory::ProfileDirectory;
use crate::profile::ProfileId;

static ASCII_CANDIDATE: Lazy<Regex> = Lazy::new(|| candidate_regex(IdentifierCharset::Ascii));
static HANGUL_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| candidate_regex(IdentifierCharset::AsciiHangul));

fn candidate_regex(charset: IdentifierCharset) -> Regex {
    Regex::new(&format!("@([{}]+)", charset.class_body()))
        .expect("mention candidate regex is valid")
}

/// Result of tokenizing, including which profiles ended up mentioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeOutcome {
    /// Canonical stored text
    pub text: String,
    /// Distinct mentioned profile IDs, in order of first appearance
    pub mentioned: Vec<ProfileId>,
}

/// Converts raw authored text into stored text with `[mention:<id>]` tokens.
#[derive(Debug, Clone)]
pub struct MentionTokenizer {
    charset: IdentifierCharset,
}

impl Default for MentionTokenizer {
    fn default() -> Self {
        Self::new(&MentionConfig::default())
    }
}

impl MentionTokenizer {
    /// Create a tokenizer for the configured charset.
    pub fn new(config: &MentionConfig) -> Self {
        Self {
            charset: config.charset,
        }
    }

    /// The charset in use.
    pub fn charset(&self) -> IdentifierCharset {
        self.charset
    }

    fn regex(&self) -> &'static Regex {
        match self.charset {
            IdentifierCharset::Ascii => &ASCII_CANDIDATE,
            IdentifierCharset::AsciiHangul => &HANGUL_CANDIDATE,
        }
    }

    /// Distinct `@username` candidates in `raw_text`, in order of first
    /// appearance (without the `@`).
    pub fn candidates(&self, raw_text: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in self.regex().captures_iter(raw_text) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Tokenize `raw_text`, returning only the stored text.
    pub async fn tokenize(&self, raw_text: &str, directory: &dyn ProfileDirectory) -> String {
        self.tokenize_with_mentions(raw_text, directory).await.text
    }

    /// Tokenize `raw_text` and report which profiles were mentioned.
    ///
    /// Never fails: if the lookup errors, the text comes back unchanged
    /// with no mentions so that saving is never blocked.
    pub async fn tokenize_with_mentions(
        &self,
        raw_text: &str,
        directory: &dyn ProfileDirectory,
    ) -> TokenizeOutcome {
        let unchanged = || TokenizeOutcome {
            text: raw_text.to_string(),
            mentioned: Vec::new(),
        };

        let candidates = self.candidates(raw_text);
        if candidates.is_empty() {
            return unchanged();
        }

        tracing::debug!(count = candidates.len(), "Resolving mention candidates");

        let resolved = match directory.profiles_by_usernames(&candidates).await {
            Ok(refs) => refs,
            Err(e) => {
                tracing::warn!(error = %e, "Mention lookup failed, storing text unchanged");
                return unchanged();
            }
        };

        let ids: HashMap<&str, &ProfileId> = resolved
            .iter()
            .filter(|r| candidates.iter().any(|c| c == &r.username))
            .filter(|r| {
                let safe = is_token_safe_id(r.id.as_str());
                if !safe {
                    tracing::warn!(
                        username = r.username.as_str(),
                        id = r.id.as_str(),
                        "Profile ID cannot be read back from a mention token, leaving literal"
                    );
                }
                safe
            })
            .map(|r| (r.username.as_str(), &r.id))
            .collect();
        if ids.is_empty() {
            return unchanged();
        }

        let mut mentioned: Vec<ProfileId> = Vec::new();
        let text = self
            .regex()
            .replace_all(raw_text, |caps: &Captures| match ids.get(&caps[1]) {
                Some(&id) => {
                    if !mentioned.contains(id) {
                        mentioned.push(id.clone());
                    }
                    format_token(id)
                }
                None => caps[0].to_string(),
            })
            .into_owned();

        TokenizeOutcome { text, mentioned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::testing::CountingDirectory;
    use crate::directory::InMemoryDirectory;
    use crate::mention::mentioned_ids;
    use crate::profile::Profile;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::with_profiles([
            Profile::new("u1", "jay", "Jay Kim"),
            Profile::new("u2", "jaylee", "Jay Lee"),
            Profile::new("u3", "ann", "Ann Park"),
            Profile::new("u4", "j.doe_2", "John Doe"),
        ])
    }

    #[tokio::test]
    async fn test_basic_mention() {
        let t = MentionTokenizer::default();
        let out = t.tokenize("hello @jay how are you?", &directory()).await;
        assert_eq!(out, "hello [mention:u1] how are you?");
    }

    #[tokio::test]
    async fn test_boundary_rule() {
        let t = MentionTokenizer::default();
        assert_eq!(t.tokenize("@anna", &directory()).await, "@anna");
        assert_eq!(t.tokenize("@ann!", &directory()).await, "[mention:u3]!");
    }

    #[tokio::test]
    async fn test_longer_name_resolves_independently() {
        let t = MentionTokenizer::default();
        let out = t.tokenize("@jay and @jaylee", &directory()).await;
        assert_eq!(out, "[mention:u1] and [mention:u2]");
    }

    #[tokio::test]
    async fn test_repeated_mentions_all_replaced() {
        let t = MentionTokenizer::default();
        let out = t
            .tokenize_with_mentions("@ann, @ann and @jay", &directory())
            .await;
        assert_eq!(out.text, "[mention:u3], [mention:u3] and [mention:u1]");
        assert_eq!(out.mentioned, vec![ProfileId::new("u3"), ProfileId::new("u1")]);
    }

    #[tokio::test]
    async fn test_dots_and_underscores() {
        let t = MentionTokenizer::default();
        let out = t.tokenize("cc @j.doe_2 please", &directory()).await;
        assert_eq!(out, "cc [mention:u4] please");
    }

    #[tokio::test]
    async fn test_trailing_period_is_part_of_the_name() {
        let t = MentionTokenizer::default();
        // "ann." is scanned as one candidate and does not resolve
        assert_eq!(t.tokenize("thanks @ann.", &directory()).await, "thanks @ann.");
    }

    #[tokio::test]
    async fn test_unknown_stays_literal() {
        let t = MentionTokenizer::default();
        let out = t.tokenize("hi @ghost and @ann", &directory()).await;
        assert_eq!(out, "hi @ghost and [mention:u3]");
    }

    #[tokio::test]
    async fn test_no_candidates_skips_lookup() {
        let dir = directory();
        dir.set_unavailable(true);
        let t = MentionTokenizer::default();
        // Would fail if a lookup were attempted, but text has no candidates
        let out = t.tokenize_with_mentions("no mentions here", &dir).await;
        assert_eq!(out.text, "no mentions here");
        assert!(out.mentioned.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_leaves_text_unchanged() {
        let dir = directory();
        dir.set_unavailable(true);
        let t = MentionTokenizer::default();
        assert_eq!(t.tokenize("hi @jay", &dir).await, "hi @jay");
    }

    #[tokio::test]
    async fn test_already_tokenized_is_idempotent() {
        let t = MentionTokenizer::default();
        let stored = "hi [mention:u1] again";
        assert_eq!(t.tokenize(stored, &directory()).await, stored);
    }

    #[tokio::test]
    async fn test_hangul_charset() {
        let dir = InMemoryDirectory::with_profiles([Profile::new("k1", "민수", "Kim Minsu")]);
        let ascii = MentionTokenizer::default();
        let hangul = MentionTokenizer::new(&MentionConfig {
            charset: IdentifierCharset::AsciiHangul,
        });

        assert_eq!(ascii.tokenize("hi @민수", &dir).await, "hi @민수");
        assert_eq!(hangul.tokenize("hi @민수", &dir).await, "hi [mention:k1]");
        // Hangul continues the identifier, so the boundary rule applies to it
        assert_eq!(hangul.tokenize("hi @민수님", &dir).await, "hi @민수님");
    }

    #[test]
    fn test_candidates_are_distinct() {
        let t = MentionTokenizer::default();
        assert_eq!(
            t.candidates("@a @b @a mail@c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_one_username_lookup_per_text() {
        let dir = CountingDirectory::new([
            Profile::new("u1", "a", "A"),
            Profile::new("u2", "b", "B"),
        ]);
        let t = MentionTokenizer::default();
        let out = t.tokenize("@a @b @a @c", &dir).await;
        assert_eq!(out, "[mention:u1] [mention:u2] [mention:u1] @c");
        assert_eq!(dir.username_lookups(), 1);

        t.tokenize("nobody mentioned", &dir).await;
        assert_eq!(dir.username_lookups(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_id_stays_literal() {
        let dir = CountingDirectory::new([
            Profile::new("u.1", "dot", "Dot"),
            Profile::new("u2", "bee", "Bee"),
        ]);
        let out = MentionTokenizer::default()
            .tokenize_with_mentions("hi @dot and @bee", &dir)
            .await;
        assert_eq!(out.text, "hi @dot and [mention:u2]");
        assert_eq!(out.mentioned, vec![ProfileId::new("u2")]);
        assert_eq!(mentioned_ids(&out.text), out.mentioned);
    }
}
