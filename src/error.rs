//! Unified error types for chatmod.
//!
//! This module provides a single [`ModError`] enum that covers every failure
//! the moderation commands can surface. Some faults never reach a caller:
//!
//! - **Load faults** are logged and replaced by an empty state
//!   (see [`JsonStateStore::load`](crate::core::store::JsonStateStore::load)).
//! - **Delete faults** are logged per message and the scan continues.
//! - **Lookup faults** are reported inline, one reply line per failed target.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chatmod operations.
///
/// # Example
///
/// ```rust
/// use chatmod::error::Result;
/// use chatmod::core::CensorshipState;
///
/// fn fresh_state() -> Result<CensorshipState> {
///     Ok(CensorshipState::new())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ModError>;

/// The error type for all chatmod operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModError {
    /// An I/O error occurred while reading or writing the state snapshot.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The keyword filter is not a valid regular expression.
    #[error("Invalid keyword pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A time span such as `3d4h` could not be parsed.
    #[error("Invalid time span '{input}'. Expected tokens like {expected}")]
    InvalidDuration {
        /// The string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// A command argument had the wrong shape (e.g. a non-numeric offset).
    #[error("Invalid value for {name}: '{value}'")]
    InvalidArgument {
        /// Option or argument name
        name: &'static str,
        /// The offending value
        value: String,
    },

    /// A chat could not be resolved (e.g. the CLI's `--chat`). In-chat
    /// commands report unresolved targets as reply lines instead.
    #[error("{0} not found")]
    NotFound(String),

    /// The chat client reported a failure (network, missing rights, ...).
    #[error("Chat client error: {0}")]
    Client(String),

    /// The persisted snapshot exists but could not be read back.
    ///
    /// Returned by `JsonStateStore::try_load`; the bot-facing `load`
    /// recovers by substituting an empty state.
    #[error("Failed to load censorship state from {}: {reason}", path.display())]
    Load {
        /// Snapshot location
        path: PathBuf,
        /// Description of what went wrong
        reason: String,
    },
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ModError {
    /// Creates an invalid time span error.
    pub fn invalid_duration(input: impl Into<String>) -> Self {
        ModError::InvalidDuration {
            input: input.into(),
            expected: "8y3d4h15m3s",
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(name: &'static str, value: impl Into<String>) -> Self {
        ModError::InvalidArgument {
            name,
            value: value.into(),
        }
    }

    /// Creates a lookup error for a user or chat specifier.
    pub fn not_found(target: impl Into<String>) -> Self {
        ModError::NotFound(target.into())
    }

    /// Creates a chat client error.
    pub fn client(message: impl Into<String>) -> Self {
        ModError::Client(message.into())
    }

    /// Creates a snapshot load error.
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ModError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ModError::Io(_))
    }

    /// Returns `true` if this is a lookup error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModError::NotFound(_))
    }

    /// Returns `true` if this is a chat client error.
    pub fn is_client(&self) -> bool {
        matches!(self, ModError::Client(_))
    }

    /// Returns `true` if this error came from user-supplied command input.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            ModError::InvalidPattern(_)
                | ModError::InvalidDuration { .. }
                | ModError::InvalidArgument { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: ModError = io_err.into();
        assert!(err.is_io());
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_invalid_duration_display() {
        let err = ModError::invalid_duration("3w");
        let display = err.to_string();
        assert!(display.contains("'3w'"));
        assert!(display.contains("8y3d4h15m3s"));
        assert!(err.is_user_input());
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = ModError::invalid_argument("offset", "abc");
        assert_eq!(err.to_string(), "Invalid value for offset: 'abc'");
        assert!(err.is_user_input());
    }

    #[test]
    fn test_pattern_error_from_regex() {
        let err: ModError = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, ModError::InvalidPattern(_)));
        assert!(err.is_user_input());
    }

    #[test]
    fn test_not_found() {
        let err = ModError::not_found("@ghost");
        assert!(err.is_not_found());
        assert!(!err.is_client());
        assert_eq!(err.to_string(), "@ghost not found");
    }

    #[test]
    fn test_load_display_includes_path() {
        let err = ModError::load("data/censoring.json", "expected value at line 1");
        let display = err.to_string();
        assert!(display.contains("data/censoring.json"));
        assert!(display.contains("expected value"));
        assert!(!err.is_user_input());
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: ModError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
