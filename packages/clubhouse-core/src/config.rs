//! # Configuration
//!
//! Runtime configuration for the mention pipeline.
//!
//! The only tunable today is which characters count as part of a username
//! when scanning for `@username` references. Two sets exist in the product:
//!
//! | Charset | Characters | Used by |
//! |---------|------------|---------|
//! | `Ascii` | `a-z A-Z 0-9 _ .` | save-time tokenizer |
//! | `AsciiHangul` | the above plus Hangul syllables `가-힣` | client-side suggestion matcher |
//!
//! Which one is correct end-to-end is undecided, so both are selectable and
//! `Ascii` is the default.

use serde::{Deserialize, Serialize};

/// Characters allowed in a mentionable username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierCharset {
    /// `[a-zA-Z0-9_.]`
    #[default]
    Ascii,
    /// `[a-zA-Z0-9_.]` plus precomposed Hangul syllables (U+AC00..=U+D7A3)
    AsciiHangul,
}

impl IdentifierCharset {
    /// Regex character class (without brackets) for this charset.
    pub(crate) fn class_body(&self) -> &'static str {
        match self {
            IdentifierCharset::Ascii => r"a-zA-Z0-9_.",
            IdentifierCharset::AsciiHangul => r"a-zA-Z0-9_.\x{AC00}-\x{D7A3}",
        }
    }

    /// Whether `c` is an identifier character under this charset.
    pub fn is_identifier_char(&self, c: char) -> bool {
        let ascii = c.is_ascii_alphanumeric() || c == '_' || c == '.';
        match self {
            IdentifierCharset::Ascii => ascii,
            IdentifierCharset::AsciiHangul => ascii || ('\u{AC00}'..='\u{D7A3}').contains(&c),
        }
    }

    /// Parse a charset name (`ascii`, `ascii-hangul`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascii" => Some(IdentifierCharset::Ascii),
            "ascii-hangul" | "ascii_hangul" | "hangul" => Some(IdentifierCharset::AsciiHangul),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierCharset::Ascii => "ascii",
            IdentifierCharset::AsciiHangul => "ascii-hangul",
        }
    }
}

/// Mention pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionConfig {
    /// Username character set used for scanning and the boundary rule
    pub charset: IdentifierCharset,
}

/// Configuration for Clubhouse Core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Mention tokenizer settings
    pub mentions: MentionConfig,
    /// Database path (in-memory if None)
    pub database_path: Option<String>,
}
