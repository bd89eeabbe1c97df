//! Configuration for the moderation commands.
//!
//! [`ModerationConfig`] is a plain serde struct with builder methods, usable
//! from code or loaded from a JSON document.
//!
//! # Example
//!
//! ```rust
//! use chatmod::config::ModerationConfig;
//!
//! let config = ModerationConfig::new()
//!     .with_state_path("/var/lib/bot/censoring.json")
//!     .with_scan_cap(200);
//!
//! assert_eq!(config.scan_cap, 200);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Runtime settings for [`Moderator`](crate::command::Moderator).
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```rust
/// use chatmod::config::ModerationConfig;
///
/// let config: ModerationConfig = serde_json::from_str(r#"{"scan_cap": 50}"#).unwrap();
/// assert_eq!(config.scan_cap, 50);
/// assert_eq!(config.default_count, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Where the censorship snapshot lives (default: `data/censoring.json`)
    pub state_path: PathBuf,

    /// Minimum number of messages a bounded purge may scan (default: 100)
    pub scan_cap: usize,

    /// Messages deleted by a purge when no count is given (default: 1)
    pub default_count: usize,

    /// Command prefixes recognised by the tokenizer (default: `["."]`)
    pub prefixes: Vec<String>,

    /// Mark the account offline after handling a command (default: true)
    pub set_offline: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("data/censoring.json"),
            scan_cap: 100,
            default_count: 1,
            prefixes: vec![".".to_string()],
            set_offline: true,
        }
    }
}

impl ModerationConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Sets the snapshot location.
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Sets the minimum bounded scan length.
    #[must_use]
    pub fn with_scan_cap(mut self, cap: usize) -> Self {
        self.scan_cap = cap;
        self
    }

    /// Sets the purge count used when none is given.
    #[must_use]
    pub fn with_default_count(mut self, count: usize) -> Self {
        self.default_count = count.max(1);
        self
    }

    /// Replaces the command prefixes.
    #[must_use]
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables the presence update after commands.
    #[must_use]
    pub fn with_set_offline(mut self, enabled: bool) -> Self {
        self.set_offline = enabled;
        self
    }
}
