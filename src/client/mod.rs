//! The chat-platform client the moderation commands talk to.
//!
//! [`ChatClient`] is the seam between this crate and a concrete bot framework.
//! Implementations wrap the platform API; [`MemoryChatClient`] keeps everything
//! in memory and backs the tests and the offline CLI.
//!
//! # Example
//!
//! ```rust
//! use chatmod::client::{ChatClient, HistoryOptions, MemoryChatClient};
//! use chatmod::message::{ChatId, Message, MessageId, User, UserId};
//! use chrono::Utc;
//! use futures_util::TryStreamExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> chatmod::Result<()> {
//! let client = MemoryChatClient::new(User::new(1));
//! client.push_message(Message::new(MessageId(1), ChatId(-5), Utc::now()).with_sender(UserId(2)));
//!
//! let history: Vec<Message> = client
//!     .history(ChatId(-5), HistoryOptions::default())
//!     .try_collect()
//!     .await?;
//! assert_eq!(history.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

use crate::error::Result;
use crate::message::{Chat, ChatId, Message, MessageId, User, UserId};

pub use memory::MemoryChatClient;

/// How a command names a user: by numeric id or by `@username`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    Id(UserId),
    Username(String),
}

impl UserRef {
    /// Classifies a target specifier.
    ///
    /// All-digit strings are ids; anything else is a username with an
    /// optional leading `@`.
    ///
    /// ```
    /// use chatmod::client::UserRef;
    /// use chatmod::message::UserId;
    ///
    /// assert_eq!(UserRef::parse("123"), UserRef::Id(UserId(123)));
    /// assert_eq!(UserRef::parse("@alice"), UserRef::Username("alice".into()));
    /// ```
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if !spec.is_empty() && spec.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = spec.parse() {
                return UserRef::Id(id);
            }
        }
        UserRef::Username(spec.trim_start_matches('@').to_string())
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "{}", id),
            UserRef::Username(name) => write!(f, "@{}", name),
        }
    }
}

/// Options for [`ChatClient::history`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Start the stream at messages sent strictly before this instant.
    pub offset_date: Option<DateTime<Utc>>,
}

impl HistoryOptions {
    #[must_use]
    pub fn with_offset_date(mut self, date: DateTime<Utc>) -> Self {
        self.offset_date = Some(date);
        self
    }
}

/// Chat-platform operations consumed by the moderation commands.
///
/// Lookups return `Ok(None)` when a target does not exist; `Err` is reserved
/// for transport or permission faults.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The account the bot runs as.
    async fn me(&self) -> Result<User>;

    /// Resolves a single user specifier.
    async fn get_user(&self, target: &UserRef) -> Result<Option<User>>;

    /// Resolves a batch of ids, silently dropping unknown ones.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>>;

    /// Resolves a chat by numeric id or `@handle`.
    async fn get_chat(&self, target: &str) -> Result<Option<Chat>>;

    /// Lazily streams a chat's history, newest first.
    fn history(&self, chat: ChatId, options: HistoryOptions) -> BoxStream<'_, Result<Message>>;

    /// Deletes one message.
    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()>;

    /// Marks the account as offline.
    async fn set_offline(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ref_parse() {
        assert_eq!(UserRef::parse("42"), UserRef::Id(UserId(42)));
        assert_eq!(UserRef::parse("@bob"), UserRef::Username("bob".into()));
        assert_eq!(UserRef::parse("bob"), UserRef::Username("bob".into()));
        assert_eq!(UserRef::parse("-42"), UserRef::Username("-42".into()));
    }

    #[test]
    fn test_user_ref_display() {
        assert_eq!(UserRef::Id(UserId(7)).to_string(), "7");
        assert_eq!(UserRef::Username("carol".into()).to_string(), "@carol");
    }

    #[test]
    fn test_history_options_builder() {
        let now = Utc::now();
        let opts = HistoryOptions::default().with_offset_date(now);
        assert_eq!(opts.offset_date, Some(now));
    }
}
