//! # Error Handling
//!
//! Error types for Clubhouse Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Lookup Errors                                                     │
//! │  │   ├── LookupFailed          - Profile collaborator call failed      │
//! │  │   ├── ProfileNotFound       - No profile with that ID/username      │
//! │  │   └── InvalidProfileId      - ID not representable in a token       │
//! │  │                                                                      │
//! │  ├── Access Errors                                                     │
//! │  │   ├── AccessDenied          - Role below forum permission level     │
//! │  │   └── NotAuthor             - Only the author may edit a post       │
//! │  │                                                                      │
//! │  ├── Content Errors                                                    │
//! │  │   ├── ForumNotFound         - Forum doesn't exist                   │
//! │  │   ├── ClubNotFound          - Club doesn't exist                    │
//! │  │   ├── PostNotFound          - Post doesn't exist                    │
//! │  │   └── InvalidContent        - Empty or malformed content            │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── DatabaseError         - SQLite failure                        │
//! │  │   └── Conflict              - Uniqueness violated                   │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      └── SerializationError    - JSON encode/decode failed             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mention pipeline and the permission evaluator never surface these
//! errors to callers: lookup failures degrade to unchanged text or
//! placeholders, and permission checks return `bool`. Errors are raised by
//! the storage layer and by the enforcement helpers that wrap the evaluator.

use thiserror::Error;

/// Result type alias for Clubhouse Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Clubhouse Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Lookup Errors (100-199)
    // ========================================================================

    /// A profile lookup collaborator call failed
    #[error("Profile lookup failed: {0}")]
    LookupFailed(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile ID contains characters a mention token cannot carry
    #[error("Invalid profile ID: {0}")]
    InvalidProfileId(String),

    // ========================================================================
    // Access Errors (200-299)
    // ========================================================================

    /// Actor's club role does not satisfy the forum permission level
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Only the original author may modify this content
    #[error("Only the author can modify this post.")]
    NotAuthor,

    // ========================================================================
    // Content Errors (300-399)
    // ========================================================================

    /// Forum not found
    #[error("Forum not found.")]
    ForumNotFound,

    /// Club not found
    #[error("Club not found.")]
    ClubNotFound,

    /// Post not found
    #[error("Post not found.")]
    PostNotFound,

    /// Invalid content
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A uniqueness constraint was violated (e.g. username taken)
    #[error("Conflict: {0}")]
    Conflict(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Lookup
    /// - 200-299: Access
    /// - 300-399: Content
    /// - 400-499: Storage
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Lookup (100-199)
            Error::LookupFailed(_) => 100,
            Error::ProfileNotFound(_) => 101,
            Error::InvalidProfileId(_) => 102,

            // Access (200-299)
            Error::AccessDenied(_) => 200,
            Error::NotAuthor => 201,

            // Content (300-399)
            Error::ForumNotFound => 300,
            Error::ClubNotFound => 301,
            Error::PostNotFound => 302,
            Error::InvalidContent(_) => 303,

            // Storage (400-499)
            Error::DatabaseError(_) => 400,
            Error::Conflict(_) => 401,

            // Internal (900-999)
            Error::SerializationError(_) => 901,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors are transient collaborator failures that may
    /// succeed on retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::LookupFailed(_) | Error::DatabaseError(_))
    }

    /// Check if this error is an authorization failure
    pub fn is_access_error(&self) -> bool {
        matches!(self, Error::AccessDenied(_) | Error::NotAuthor)
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                return Error::Conflict(err.to_string());
            }
        }
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
