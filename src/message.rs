//! Chat-platform entities seen by the moderation commands.
//!
//! This module provides the identifier newtypes ([`ChatId`], [`UserId`],
//! [`MessageId`]) and the minimal views of users, chats and messages that the
//! [`ChatClient`](crate::client::ChatClient) hands back.
//!
//! # Examples
//!
//! ```
//! use chatmod::message::{ChatId, Message, MessageId, UserId};
//! use chrono::Utc;
//!
//! let msg = Message::new(MessageId(7), ChatId(-100), Utc::now())
//!     .with_sender(UserId(42))
//!     .with_text("hello");
//!
//! assert_eq!(msg.sender, Some(UserId(42)));
//! assert_eq!(msg.text(), "hello");
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                $name(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a chat, group or channel. Groups and channels are negative.
    ChatId
);
id_type!(
    /// Identifier of a user account.
    UserId
);
id_type!(
    /// Identifier of a message, unique within its chat.
    MessageId
);

/// A user account as returned by user lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    /// Creates a user with only an id.
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            username: None,
            first_name: None,
            last_name: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: Option<&str>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = last.map(str::to_string);
        self
    }

    /// Human-readable handle used in command replies.
    ///
    /// Prefers `@username`, then the full name, then the numeric id.
    ///
    /// ```
    /// use chatmod::message::User;
    ///
    /// assert_eq!(User::new(1).with_username("alice").display_name(), "@alice");
    /// assert_eq!(User::new(2).with_name("Bob", Some("Ross")).display_name(), "Bob Ross");
    /// assert_eq!(User::new(3).display_name(), "3");
    /// ```
    pub fn display_name(&self) -> String {
        if let Some(ref username) = self.username {
            return format!("@{}", username);
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.id.to_string(),
        }
    }
}

/// A chat as returned by chat lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Chat {
    pub fn new(id: impl Into<ChatId>) -> Self {
        Self {
            id: id.into(),
            username: None,
            title: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A message in a chat's history.
///
/// | Field | Description |
/// |-------|-------------|
/// | `sender` | Author account, `None` for anonymous admins and channel posts |
/// | `sender_chat` | Channel or group the message was posted on behalf of |
/// | `text` / `caption` | Body; media messages carry a caption instead |
/// | `date` | When the message was sent |
/// | `edited` | Set on edit events |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    pub chat: ChatId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_chat: Option<ChatId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    pub date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates an empty message with no author and no body.
    pub fn new(id: MessageId, chat: ChatId, date: DateTime<Utc>) -> Self {
        Self {
            id,
            chat,
            sender: None,
            sender_chat: None,
            text: None,
            caption: None,
            date,
            edited: None,
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    #[must_use]
    pub fn with_sender(mut self, sender: UserId) -> Self {
        self.sender = Some(sender);
        self
    }

    #[must_use]
    pub fn with_sender_chat(mut self, chat: ChatId) -> Self {
        self.sender_chat = Some(chat);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn with_edited(mut self, edited: DateTime<Utc>) -> Self {
        self.edited = Some(edited);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Searchable body of the message: the text, else the media caption,
    /// else an empty string.
    pub fn text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or("")
    }

    /// Returns `true` if this is an edit event rather than a new message.
    pub fn is_edit(&self) -> bool {
        self.edited.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_id_parse_and_display() {
        assert_eq!("-1001234".parse::<ChatId>().unwrap(), ChatId(-1001234));
        assert_eq!(" 42 ".parse::<UserId>().unwrap(), UserId(42));
        assert!("abc".parse::<UserId>().is_err());
        assert_eq!(MessageId(9).to_string(), "9");
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let json = serde_json::to_string(&UserId(5)).unwrap();
        assert_eq!(json, "5");
        let parsed: ChatId = serde_json::from_str("-7").unwrap();
        assert_eq!(parsed, ChatId(-7));
    }

    #[test]
    fn test_text_falls_back_to_caption() {
        let msg = Message::new(MessageId(1), ChatId(1), at(0)).with_caption("photo");
        assert_eq!(msg.text(), "photo");

        let msg = msg.with_text("body");
        assert_eq!(msg.text(), "body");

        let empty = Message::new(MessageId(2), ChatId(1), at(0));
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn test_is_edit() {
        let msg = Message::new(MessageId(1), ChatId(1), at(10));
        assert!(!msg.is_edit());
        assert!(msg.with_edited(at(20)).is_edit());
    }

    #[test]
    fn test_message_serde_omits_empty_fields() {
        let msg = Message::new(MessageId(3), ChatId(-5), at(1_700_000_000)).with_sender(UserId(8));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("caption"));
        assert!(!json.contains("sender_chat"));
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_display_name_last_only() {
        let mut user = User::new(4);
        user.last_name = Some("Solo".into());
        assert_eq!(user.display_name(), "Solo");
    }
}
