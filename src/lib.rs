//! # Chatmod
//!
//! Moderation commands for chat bots: delete-on-sight censorship of chosen
//! users or whole chats, an immunity list, and filtered batch purges of chat
//! history.
//!
//! ## Overview
//!
//! The crate is organised around three pieces of logic:
//! - **Censorship state** - who is censored where, and who is immune
//! - **Snapshot store** - JSON persistence of that state
//! - **Purge engine** - a bounded newest-first history scan with keyword,
//!   offset, count and time filters
//!
//! The chat platform itself is abstracted behind [`ChatClient`](client::ChatClient);
//! [`Moderator`](command::Moderator) wires everything into command handlers.
//!
//! ## Quick Start
//!
//! ```rust
//! use chatmod::prelude::*;
//! use chrono::Utc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let client = MemoryChatClient::new(User::new(1));
//! let moderator = Moderator::new(client, MemoryStateStore::new(), ModerationConfig::new());
//!
//! let cmd = Message::new(MessageId(1), ChatId(-42), Utc::now())
//!     .with_sender(UserId(1))
//!     .with_text(".censor -mass");
//! let reply = moderator.dispatch(&Invocation::new(cmd, User::new(1))).await?;
//! assert_eq!(reply.as_deref(), Some("` → ` Mass censoring\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`core`] - State model, persistence, purge engine
//! - [`client`] - The [`ChatClient`](client::ChatClient) seam and an in-memory client
//! - [`command`] - Command handlers, tokenizer, passive listener, help
//! - [`message`] - Ids, users, chats and messages
//! - [`config`] - [`ModerationConfig`](config::ModerationConfig)
//! - [`error`] - Unified error types ([`ModError`], [`Result`])
//! - [`prelude`] - Convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod message;

// Re-export the main types at the crate root for convenience
pub use error::{ModError, Result};
pub use message::Message;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatmod::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ModError, Result};
    pub use crate::message::{Chat, ChatId, Message, MessageId, User, UserId};

    pub use crate::client::{ChatClient, HistoryOptions, MemoryChatClient, UserRef};
    pub use crate::config::ModerationConfig;

    pub use crate::core::{
        CensorshipState, JsonStateStore, MemoryStateStore, PurgeReport, PurgeRequest,
        StateStore, parse_timedelta, purge, span_before,
    };

    pub use crate::command::args::CommandArgs;
    pub use crate::command::{Invocation, Moderator};
}
