//! `purge` (aliases `wipe`, `clear`): batch delete recent messages.
//!
//! ```text
//! purge [-k <regex>] [-o <n>] [-before <span>] [-after <span>] [-all]
//!       [-id "<ids>"] [-g <chat>] [-lim <n>] [-full] [<@targets>] [<n>]
//! ```
//!
//! Without targets, messages from the replied-to author (or from the sender)
//! are purged. Time spans are measured back from the command message.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::info;

use super::args::CommandArgs;
use super::{Invocation, Moderator, line, not_found_line};
use crate::client::{ChatClient, UserRef};
use crate::core::{PurgeRequest, StateStore, purge, span_before};
use crate::error::{ModError, Result};

impl<C: ChatClient, S: StateStore> Moderator<C, S> {
    /// Handles the `purge` command.
    ///
    /// The reply is always `Done` unless the request could not be built; the
    /// number of deleted messages is not reported.
    pub async fn purge(&self, invocation: &Invocation, args: &CommandArgs) -> Result<String> {
        let mut out = String::new();
        let Some(request) = self.build_purge_request(invocation, args, &mut out).await? else {
            self.mark_offline().await;
            return Ok(out);
        };

        info!(
            chat = %request.chat,
            "Purging last {} message from {:?}",
            request.count,
            request.targets
        );
        purge(&self.client, &request).await?;

        self.mark_offline().await;
        out += &line("Done");
        Ok(out)
    }

    /// Translates command arguments into a [`PurgeRequest`].
    ///
    /// Returns `None`, with the reason written to `out`, when the command
    /// named targets but none of them could be resolved.
    async fn build_purge_request(
        &self,
        invocation: &Invocation,
        args: &CommandArgs,
        out: &mut String,
    ) -> Result<Option<PurgeRequest>> {
        let now = invocation.message.date;

        let chat = match args.option("group") {
            Some(group) => match self.client.get_chat(group).await? {
                Some(chat) => chat.id,
                None => {
                    *out += &not_found_line(group);
                    return Ok(None);
                }
            },
            None => invocation.chat(),
        };

        let mut request = PurgeRequest::new(chat)
            .with_scan_cap(self.config.scan_cap)
            .with_count(self.config.default_count)
            .with_delete_all(args.has_flag("-all"))
            .with_hard_limit(!args.has_flag("-full"));

        if chat == invocation.chat() {
            request = request.with_trigger(invocation.message.id);
        }
        if let Some(pattern) = args.option("keyword") {
            request = request.with_keyword(Regex::new(pattern)?);
        }
        if let Some(offset) = args.parsed_option::<usize>("offset")? {
            request = request.with_offset(offset);
        }
        if let Some(span) = args.option("before") {
            request = request.with_before(span_before(now, span)?);
        }
        if let Some(span) = args.option("after") {
            request = request.with_after(span_before(now, span)?);
        }
        if let Some(limit) = args.parsed_option::<usize>("limit")? {
            request = request.with_count(limit);
        }

        let mut targets = BTreeSet::new();
        let mut unresolved = false;
        for arg in &args.positional {
            if arg == "@me" {
                targets.insert(invocation.sender.id.0);
            } else if arg.starts_with('@') {
                match self.client.get_user(&UserRef::parse(arg)).await? {
                    Some(user) => {
                        targets.insert(user.id.0);
                    }
                    None => {
                        *out += &not_found_line(arg);
                        unresolved = true;
                    }
                }
            } else if let Ok(count) = arg.parse::<usize>() {
                request = request.with_count(count);
            }
        }
        if let Some(ids) = args.option("ids") {
            for raw in ids.split_whitespace() {
                let id = raw
                    .parse::<i64>()
                    .map_err(|_| ModError::invalid_argument("ids", raw))?;
                targets.insert(id);
            }
        }

        if targets.is_empty() {
            if unresolved {
                return Ok(None);
            }
            let fallback = invocation
                .reply_author
                .as_ref()
                .unwrap_or(&invocation.sender);
            targets.insert(fallback.id.0);
        }
        request.targets = targets;
        Ok(Some(request))
    }
}
