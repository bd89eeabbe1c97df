//! `censor` and `free`: manage who gets deleted on sight.
//!
//! | Invocation | Effect |
//! |------------|--------|
//! | `censor <targets>` | censor targets in the current chat |
//! | `censor -mass` | censor everyone in the current chat |
//! | `censor -i <targets>` | revoke immunity |
//! | `censor -list` | list users censored in the current chat |
//! | `free <targets>` | stop censoring targets in the current chat |
//! | `free -mass` | lift mass censorship |
//! | `free -i <targets>` | grant immunity from mass censorship |
//! | `free -list` | list immune users |
//!
//! Replying to a message adds its author to the targets.

use tracing::info;

use super::args::CommandArgs;
use super::{Invocation, Moderator, finish, line};
use crate::client::ChatClient;
use crate::core::StateStore;
use crate::error::Result;
use crate::message::UserId;

impl<C: ChatClient, S: StateStore> Moderator<C, S> {
    /// Handles the `censor` command.
    pub async fn censor(&self, invocation: &Invocation, args: &CommandArgs) -> Result<String> {
        let chat = invocation.chat();
        let mut out = String::new();

        if args.has_flag("-list") {
            let ids: Vec<UserId> = self
                .lock_state()
                .await
                .list_specific(chat)
                .into_iter()
                .collect();
            out += &self.list_users(&ids).await?;
        } else if args.has_flag("-mass") {
            info!(chat = %chat, "mass censoring chat");
            if self.update(|s| s.enable_mass(chat)).await? {
                out += &line("Mass censoring");
            }
        } else if args.targets().next().is_some() || invocation.reply_author.is_some() {
            info!(chat = %chat, "censoring users");
            let (users, lookup) = self.resolve_targets(invocation, args).await?;
            out += &lookup;

            let mut state = self.lock_state().await;
            let mut changed = false;
            for user in &users {
                let name = user.display_name();
                if args.has_flag("-i") {
                    if state.revoke_immunity(user.id) {
                        out += &line(format!("{} is no longer immune", name));
                        changed = true;
                    }
                } else if state.censor_specific(chat, user.id) {
                    out += &line(format!("Censoring {}", name));
                    changed = true;
                } else {
                    out += &line(format!("{} is already censored", name));
                }
            }
            if changed {
                self.store.save(&state)?;
            }
        }

        self.mark_offline().await;
        Ok(finish(out))
    }

    /// Handles the `free` command.
    pub async fn free(&self, invocation: &Invocation, args: &CommandArgs) -> Result<String> {
        let chat = invocation.chat();
        let mut out = String::new();

        if args.has_flag("-list") {
            let ids: Vec<UserId> = self.lock_state().await.list_immune().into_iter().collect();
            out += &self.list_users(&ids).await?;
        } else if args.has_flag("-mass") {
            info!(chat = %chat, "disabling mass censorship");
            if self.update(|s| s.disable_mass(chat)).await? {
                out += &line("Restored freedom of speech");
            }
        } else if args.targets().next().is_some() || invocation.reply_author.is_some() {
            info!(chat = %chat, "freeing censored users");
            let (users, lookup) = self.resolve_targets(invocation, args).await?;
            out += &lookup;

            let mut state = self.lock_state().await;
            let mut changed = false;
            for user in &users {
                let name = user.display_name();
                if args.has_flag("-i") {
                    if state.grant_immunity(user.id) {
                        out += &line(format!("{} is now immune", name));
                        changed = true;
                    } else {
                        out += &line(format!("{} is already immune", name));
                    }
                } else if state.free_specific(chat, user.id) {
                    out += &line(format!("Freeing {}", name));
                    changed = true;
                }
            }
            if changed {
                self.store.save(&state)?;
            }
        }

        self.mark_offline().await;
        Ok(finish(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryChatClient;
    use crate::command::NOTHING_TO_DISPLAY;
    use crate::config::ModerationConfig;
    use crate::core::MemoryStateStore;
    use crate::message::{ChatId, Message, MessageId, User};
    use chrono::Utc;

    const CHAT: ChatId = ChatId(-77);

    fn moderator() -> Moderator<MemoryChatClient, MemoryStateStore> {
        let client = MemoryChatClient::new(User::new(1).with_username("bot"));
        client.add_user(User::new(2).with_username("alice"));
        client.add_user(User::new(3).with_name("Bob", None));
        Moderator::new(client, MemoryStateStore::new(), ModerationConfig::new())
    }

    fn invocation() -> Invocation {
        let msg = Message::new(MessageId(1), CHAT, Utc::now()).with_sender(UserId(1));
        Invocation::new(msg, User::new(1))
    }

    #[tokio::test]
    async fn test_censor_targets_and_persist() {
        let m = moderator();
        let args = CommandArgs::new().with_positional("@alice").with_positional("3");
        let reply = m.censor(&invocation(), &args).await.unwrap();

        assert_eq!(reply, "` → ` Censoring @alice\n` → ` Censoring Bob\n");
        assert!(m.state().await.is_censored(CHAT, UserId(2)));
        assert!(m.store().snapshot().unwrap().contains("\"-77\""));
    }

    #[tokio::test]
    async fn test_censor_unknown_target_reports_and_continues() {
        let m = moderator();
        let args = CommandArgs::new()
            .with_positional("@ghost")
            .with_positional("-delme")
            .with_positional("@alice");
        let reply = m.censor(&invocation(), &args).await.unwrap();

        assert_eq!(
            reply,
            "`[!] → ` @ghost not found\n` → ` Censoring @alice\n"
        );
    }

    #[tokio::test]
    async fn test_censor_reply_author() {
        let m = moderator();
        let inv = invocation().replying_to(User::new(9).with_username("replied"));
        let reply = m.censor(&inv, &CommandArgs::new()).await.unwrap();
        assert_eq!(reply, "` → ` Censoring @replied\n");
        assert!(m.state().await.is_censored(CHAT, UserId(9)));
    }

    #[tokio::test]
    async fn test_censor_without_targets_has_nothing_to_display() {
        let m = moderator();
        let reply = m.censor(&invocation(), &CommandArgs::new()).await.unwrap();
        assert_eq!(reply, NOTHING_TO_DISPLAY);
        assert!(m.store().snapshot().is_none());
    }

    #[tokio::test]
    async fn test_censor_mass_twice() {
        let m = moderator();
        let args = CommandArgs::new().with_flag("-mass");
        assert_eq!(
            m.censor(&invocation(), &args).await.unwrap(),
            "` → ` Mass censoring\n"
        );
        assert_eq!(m.censor(&invocation(), &args).await.unwrap(), NOTHING_TO_DISPLAY);
    }

    #[tokio::test]
    async fn test_censor_list() {
        let m = moderator();
        let list = CommandArgs::new().with_flag("-list");
        assert_eq!(
            m.censor(&invocation(), &list).await.unwrap(),
            "` → ` Nothing to display\n"
        );

        m.censor(&invocation(), &CommandArgs::new().with_positional("2"))
            .await
            .unwrap();
        assert_eq!(m.censor(&invocation(), &list).await.unwrap(), "` → ` @alice\n");
    }

    #[tokio::test]
    async fn test_free_mass_when_not_mass_is_noop() {
        let m = moderator();
        let reply = m
            .free(&invocation(), &CommandArgs::new().with_flag("-mass"))
            .await
            .unwrap();
        assert_eq!(reply, NOTHING_TO_DISPLAY);
        assert!(m.state().await.is_empty());
    }

    #[tokio::test]
    async fn test_free_specific() {
        let m = moderator();
        let target = CommandArgs::new().with_positional("@alice");
        m.censor(&invocation(), &target).await.unwrap();

        let reply = m.free(&invocation(), &target).await.unwrap();
        assert_eq!(reply, "` → ` Freeing @alice\n");
        assert!(!m.state().await.is_censored(CHAT, UserId(2)));

        // freeing again, and in a chat with no entry, is silent
        assert_eq!(m.free(&invocation(), &target).await.unwrap(), NOTHING_TO_DISPLAY);
    }

    #[tokio::test]
    async fn test_immunity_round_trip() {
        let m = moderator();
        let grant = CommandArgs::new().with_flag("-i").with_positional("@alice");
        assert_eq!(
            m.free(&invocation(), &grant).await.unwrap(),
            "` → ` @alice is now immune\n"
        );
        assert_eq!(
            m.free(&invocation(), &grant).await.unwrap(),
            "` → ` @alice is already immune\n"
        );
        assert_eq!(
            m.free(&invocation(), &CommandArgs::new().with_flag("-list"))
                .await
                .unwrap(),
            "` → ` @alice\n"
        );

        let revoke = CommandArgs::new().with_flag("-i").with_positional("@alice");
        assert_eq!(
            m.censor(&invocation(), &revoke).await.unwrap(),
            "` → ` @alice is no longer immune\n"
        );
        assert!(!m.state().await.is_immune(UserId(2)));
        // revoking does not censor
        assert!(!m.state().await.is_censored(CHAT, UserId(2)));
    }

    #[tokio::test]
    async fn test_commands_mark_offline() {
        let m = moderator();
        m.censor(&invocation(), &CommandArgs::new()).await.unwrap();
        m.free(&invocation(), &CommandArgs::new()).await.unwrap();
        assert_eq!(m.client().offline_calls(), 2);
    }
}
