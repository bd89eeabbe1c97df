//! Command handlers and the passive censorship listener.
//!
//! [`Moderator`] owns the [`CensorshipState`] behind a single async mutex and
//! saves it through a [`StateStore`] while still holding that lock, so
//! concurrent commands cannot interleave mutations or snapshot writes.
//!
//! Authorization is not checked here: the bot framework must only route
//! commands from allowed senders. Listener events can come from anyone.
//!
//! # Example
//!
//! ```rust
//! use chatmod::client::MemoryChatClient;
//! use chatmod::command::{Invocation, Moderator};
//! use chatmod::config::ModerationConfig;
//! use chatmod::core::MemoryStateStore;
//! use chatmod::message::{ChatId, Message, MessageId, User, UserId};
//! use chrono::Utc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> chatmod::Result<()> {
//! let client = MemoryChatClient::new(User::new(1).with_username("bot"));
//! client.add_user(User::new(2).with_username("troll"));
//! let moderator = Moderator::new(client, MemoryStateStore::new(), ModerationConfig::new());
//!
//! let cmd = Message::new(MessageId(10), ChatId(-5), Utc::now())
//!     .with_sender(UserId(1))
//!     .with_text(".censor @troll");
//! let reply = moderator.dispatch(&Invocation::new(cmd, User::new(1))).await?;
//! assert_eq!(reply.as_deref(), Some("` → ` Censoring @troll\n"));
//!
//! let spam = Message::new(MessageId(11), ChatId(-5), Utc::now()).with_sender(UserId(2));
//! assert!(moderator.on_message(&spam).await?);
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod censor;
pub mod help;
pub mod listener;
pub mod purge;

use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::warn;

use crate::client::{ChatClient, UserRef};
use crate::config::ModerationConfig;
use crate::core::{CensorshipState, JsonStateStore, StateStore};
use crate::error::Result;
use crate::message::{ChatId, Message, User, UserId};

use args::{CENSOR, CommandArgs, CommandSpec, FREE, PURGE};

/// Reply sent when a command produced no output.
pub const NOTHING_TO_DISPLAY: &str = "` → ` Nothing to display";

/// Formats one reply line.
pub(crate) fn line(text: impl std::fmt::Display) -> String {
    format!("` → ` {}\n", text)
}

/// Formats one reply line for a target that could not be resolved.
pub(crate) fn not_found_line(target: impl std::fmt::Display) -> String {
    format!("`[!] → ` {} not found\n", target)
}

/// The command message and the context it was sent in.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The message carrying the command text.
    pub message: Message,
    /// Who sent it.
    pub sender: User,
    /// Author of the message the command replies to, if any.
    pub reply_author: Option<User>,
}

impl Invocation {
    pub fn new(message: Message, sender: User) -> Self {
        Self {
            message,
            sender,
            reply_author: None,
        }
    }

    #[must_use]
    pub fn replying_to(mut self, author: User) -> Self {
        self.reply_author = Some(author);
        self
    }

    pub fn chat(&self) -> ChatId {
        self.message.chat
    }
}

/// Commands understood by [`Moderator::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Censor,
    Free,
    Purge,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Censor, Command::Free, Command::Purge];

    pub fn spec(self) -> &'static CommandSpec {
        match self {
            Command::Censor => &CENSOR,
            Command::Free => &FREE,
            Command::Purge => &PURGE,
        }
    }
}

/// Moderation command handlers bound to a chat client and a state store.
pub struct Moderator<C, S = JsonStateStore> {
    client: C,
    store: S,
    state: Mutex<CensorshipState>,
    config: ModerationConfig,
    me: OnceCell<UserId>,
}

impl<C: ChatClient> Moderator<C, JsonStateStore> {
    /// Creates a moderator persisting to `config.state_path`.
    pub fn open(client: C, config: ModerationConfig) -> Self {
        let store = JsonStateStore::new(config.state_path.clone());
        Self::new(client, store, config)
    }
}

impl<C: ChatClient, S: StateStore> Moderator<C, S> {
    /// Creates a moderator, loading the initial state from `store`.
    pub fn new(client: C, store: S, config: ModerationConfig) -> Self {
        let state = store.load();
        Self {
            client,
            store,
            state: Mutex::new(state),
            config,
            me: OnceCell::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// A copy of the current censorship state.
    pub async fn state(&self) -> CensorshipState {
        self.state.lock().await.clone()
    }

    /// Routes a command message to its handler.
    ///
    /// Returns `Ok(None)` if the message is not one of the moderation commands.
    pub async fn dispatch(&self, invocation: &Invocation) -> Result<Option<String>> {
        let text = invocation.message.text();
        for command in Command::ALL {
            let prefixes = self.config.prefixes.as_slice();
            let Some(args) = CommandArgs::parse(text, prefixes, command.spec()) else {
                continue;
            };
            let reply = match command {
                Command::Censor => self.censor(invocation, &args).await?,
                Command::Free => self.free(invocation, &args).await?,
                Command::Purge => self.purge(invocation, &args).await?,
            };
            return Ok(Some(reply));
        }
        Ok(None)
    }

    async fn lock_state(&self) -> MutexGuard<'_, CensorshipState> {
        self.state.lock().await
    }

    /// Applies `f` under the state lock and saves if it changed anything.
    async fn update<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut CensorshipState) -> bool,
    {
        let mut state = self.lock_state().await;
        let changed = f(&mut state);
        if changed {
            self.store.save(&state)?;
        }
        Ok(changed)
    }

    async fn my_id(&self) -> Result<UserId> {
        self.me
            .get_or_try_init(|| async { self.client.me().await.map(|u| u.id) })
            .await
            .copied()
    }

    /// Resolves the reply author and each target specifier.
    ///
    /// Unknown targets become reply lines; the rest are still resolved.
    async fn resolve_targets(
        &self,
        invocation: &Invocation,
        args: &CommandArgs,
    ) -> Result<(Vec<User>, String)> {
        let mut users = Vec::new();
        let mut out = String::new();
        if let Some(ref author) = invocation.reply_author {
            users.push(author.clone());
        }
        for target in args.targets() {
            match self.client.get_user(&UserRef::parse(target)).await? {
                Some(user) => users.push(user),
                None => out += &not_found_line(target),
            }
        }
        Ok((users, out))
    }

    /// One reply line per user display name.
    async fn list_users(&self, ids: &[UserId]) -> Result<String> {
        if ids.is_empty() {
            return Ok(line("Nothing to display"));
        }
        let users = self.client.get_users(ids).await?;
        Ok(users.iter().map(|u| line(u.display_name())).collect())
    }

    pub(crate) async fn mark_offline(&self) {
        if !self.config.set_offline {
            return;
        }
        if let Err(e) = self.client.set_offline().await {
            warn!(error = %e, "could not update presence");
        }
    }
}

/// Turns accumulated reply lines into the final reply text.
pub(crate) fn finish(out: String) -> String {
    if out.is_empty() {
        NOTHING_TO_DISPLAY.to_string()
    } else {
        out
    }
}
