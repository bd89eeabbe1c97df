//! In-memory [`ChatClient`] implementation.
//!
//! Holds users, chats and message histories behind a mutex and records every
//! side effect (deletions, presence updates) so callers can inspect them.
//! Deleting a message removes it from the stored history.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};

use super::{ChatClient, HistoryOptions, UserRef};
use crate::error::{ModError, Result};
use crate::message::{Chat, ChatId, Message, MessageId, User, UserId};

/// Serialized form of a [`MemoryChatClient`], used by the CLI.
///
/// ```json
/// {
///   "me": {"id": 1, "username": "bot"},
///   "users": [{"id": 2, "username": "alice"}],
///   "messages": [{"id": 10, "chat": -100, "sender": 2, "text": "hi", "date": "2024-01-15T10:30:00Z"}]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDump {
    pub me: User,

    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub chats: Vec<Chat>,

    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    chats: BTreeMap<ChatId, Chat>,
    history: BTreeMap<ChatId, Vec<Message>>,
    undeletable: BTreeSet<(ChatId, MessageId)>,
    deleted: Vec<(ChatId, MessageId)>,
}

/// A chat client that never touches the network.
#[derive(Debug)]
pub struct MemoryChatClient {
    me: User,
    inner: Mutex<Inner>,
    yielded: AtomicUsize,
    offline_calls: AtomicUsize,
}

impl MemoryChatClient {
    /// Creates an empty client running as `me`.
    pub fn new(me: User) -> Self {
        let mut inner = Inner::default();
        inner.users.insert(me.id, me.clone());
        Self {
            me,
            inner: Mutex::new(inner),
            yielded: AtomicUsize::new(0),
            offline_calls: AtomicUsize::new(0),
        }
    }

    /// Builds a client from a [`HistoryDump`].
    pub fn from_dump(dump: HistoryDump) -> Self {
        let client = Self::new(dump.me);
        for user in dump.users {
            client.add_user(user);
        }
        for chat in dump.chats {
            client.add_chat(chat);
        }
        for msg in dump.messages {
            client.push_message(msg);
        }
        client
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a user for lookups.
    pub fn add_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Registers a chat for lookups.
    pub fn add_chat(&self, chat: Chat) {
        self.lock().chats.insert(chat.id, chat);
    }

    /// Appends a message to its chat's history.
    pub fn push_message(&self, msg: Message) {
        self.lock().history.entry(msg.chat).or_default().push(msg);
    }

    /// Makes every delete of this message fail, as if rights were missing.
    pub fn deny_delete(&self, chat: ChatId, message: MessageId) {
        self.lock().undeletable.insert((chat, message));
    }

    /// Successful deletions, in the order they happened.
    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.lock().deleted.clone()
    }

    /// Ids of the messages still present in a chat, newest first.
    pub fn remaining(&self, chat: ChatId) -> Vec<MessageId> {
        let inner = self.lock();
        let mut msgs: Vec<&Message> = inner.history.get(&chat).into_iter().flatten().collect();
        msgs.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));
        msgs.into_iter().map(|m| m.id).collect()
    }

    /// Total number of messages handed out by history streams.
    pub fn messages_yielded(&self) -> usize {
        self.yielded.load(Ordering::Relaxed)
    }

    /// Number of presence updates requested.
    pub fn offline_calls(&self) -> usize {
        self.offline_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatClient for MemoryChatClient {
    async fn me(&self) -> Result<User> {
        Ok(self.me.clone())
    }

    async fn get_user(&self, target: &UserRef) -> Result<Option<User>> {
        let inner = self.lock();
        let found = match target {
            UserRef::Id(id) => inner.users.get(id).cloned(),
            UserRef::Username(name) => inner
                .users
                .values()
                .find(|u| {
                    u.username
                        .as_deref()
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
                })
                .cloned(),
        };
        Ok(found)
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let inner = self.lock();
        Ok(ids.iter().filter_map(|id| inner.users.get(id).cloned()).collect())
    }

    async fn get_chat(&self, target: &str) -> Result<Option<Chat>> {
        let inner = self.lock();
        if let Ok(id) = target.parse::<ChatId>() {
            let known = inner.chats.get(&id).cloned();
            // Chats that only appear in history are still addressable.
            let seen = inner.history.contains_key(&id).then(|| Chat::new(id));
            return Ok(known.or(seen));
        }
        let handle = target.trim_start_matches('@');
        Ok(inner
            .chats
            .values()
            .find(|c| {
                c.username
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(handle))
            })
            .cloned())
    }

    fn history(&self, chat: ChatId, options: HistoryOptions) -> BoxStream<'_, Result<Message>> {
        let mut msgs: Vec<Message> = self
            .lock()
            .history
            .get(&chat)
            .into_iter()
            .flatten()
            .filter(|m| options.offset_date.is_none_or(|offset| m.date < offset))
            .cloned()
            .collect();
        msgs.sort_by(|a, b| (b.date, b.id).cmp(&(a.date, a.id)));

        stream::iter(msgs)
            .inspect(|_| {
                self.yielded.fetch_add(1, Ordering::Relaxed);
            })
            .map(Ok)
            .boxed()
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()> {
        let mut inner = self.lock();
        if inner.undeletable.contains(&(chat, message)) {
            return Err(ModError::client(format!(
                "not enough rights to delete message {} in {}",
                message, chat
            )));
        }
        if let Some(msgs) = inner.history.get_mut(&chat) {
            msgs.retain(|m| m.id != message);
        }
        inner.deleted.push((chat, message));
        Ok(())
    }

    async fn set_offline(&self) -> Result<()> {
        self.offline_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
