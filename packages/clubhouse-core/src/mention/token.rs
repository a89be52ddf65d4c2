//! # Mention Token Format
//!
//! The persisted wire format for a mention, embedded directly in content
//! text:
//!
//! ```text
//!   [mention:3f2c9a1e-7b4d-4e8a-9c1f-0a2b3c4d5e6f]
//!   ^^^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ ^
//!   prefix    profile ID (never a username)        suffix
//! ```
//!
//! This format must stay bit-exact: existing rows are read back with it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::profile::ProfileId;

/// Keyword inside the token. A bare search for it is treated as structural.
pub const MENTION_KEYWORD: &str = "mention";

/// Literal text opening a token.
pub const TOKEN_PREFIX: &str = "[mention:";

/// Literal text closing a token.
pub const TOKEN_SUFFIX: &str = "]";

/// Characters a profile ID may contain and still be read back from a token.
const TOKEN_ID_CLASS: &str = "[0-9A-Za-z_-]";

/// Matches one token and captures its ID.
pub(crate) static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\[mention:({}+)\]", TOKEN_ID_CLASS))
        .expect("mention token regex is valid")
});

static TOKEN_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}+$", TOKEN_ID_CLASS)).expect("token id regex is valid")
});

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid regex is valid")
});

/// Format the token for a profile ID.
pub fn format_token(id: &ProfileId) -> String {
    format!("{}{}{}", TOKEN_PREFIX, id.as_str(), TOKEN_SUFFIX)
}

/// Distinct profile IDs referenced by tokens in `stored_text`, in order of
/// first appearance.
pub fn mentioned_ids(stored_text: &str) -> Vec<ProfileId> {
    let mut ids: Vec<ProfileId> = Vec::new();
    for caps in TOKEN_REGEX.captures_iter(stored_text) {
        let id = ProfileId::new(&caps[1]);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Distinct profile IDs referenced across many stored texts.
pub fn mentioned_ids_in<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<ProfileId> {
    let mut ids: Vec<ProfileId> = Vec::new();
    for text in texts {
        for id in mentioned_ids(text) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Whether `id` survives a round trip through [`format_token`] and the
/// token scanner. UUIDs always do.
pub fn is_token_safe_id(id: &str) -> bool {
    TOKEN_ID_REGEX.is_match(id)
}

/// Whether `s` has the 8-4-4-4-12 hex shape of a UUID.
pub fn looks_like_uuid(s: &str) -> bool {
    UUID_REGEX.is_match(s.trim())
}
