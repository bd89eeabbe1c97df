//! Command-line interface definition using clap.
//!
//! The `chatmod` binary works offline: it edits the censorship snapshot the
//! bot loads at startup, and dry-runs purges against a history dump.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Offline tooling for chat moderation state and purges.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatmod")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatmod state show
    chatmod state --state data/censoring.json censor -1001234 42 43
    chatmod state mass -1001234
    chatmod purge history.json --chat -1001234 --from 42 -n 5 -k spam
    chatmod commands")]
pub struct Args {
    /// Log more (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Inspect or edit the censorship snapshot
    State(StateArgs),

    /// Dry-run a purge against a JSON history dump
    Purge(PurgeArgs),

    /// Describe the chat commands
    Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StateArgs {
    /// Snapshot location
    #[arg(long, value_name = "PATH", default_value = "data/censoring.json")]
    pub state: PathBuf,

    #[command(subcommand)]
    pub action: StateAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum StateAction {
    /// Print mass-censored chats, immune users and per-chat targets
    Show,

    /// Censor users in a chat
    Censor {
        #[arg(allow_negative_numbers = true)]
        chat: i64,
        #[arg(required = true)]
        users: Vec<i64>,
    },

    /// Stop censoring users in a chat
    Free {
        #[arg(allow_negative_numbers = true)]
        chat: i64,
        #[arg(required = true)]
        users: Vec<i64>,
    },

    /// Censor everyone in a chat
    Mass {
        #[arg(allow_negative_numbers = true)]
        chat: i64,
    },

    /// Lift mass censorship in a chat
    Unmass {
        #[arg(allow_negative_numbers = true)]
        chat: i64,
    },

    /// Make users immune to mass censorship
    Immune {
        #[arg(required = true)]
        users: Vec<i64>,
    },

    /// Revoke immunity
    Revoke {
        #[arg(required = true)]
        users: Vec<i64>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PurgeArgs {
    /// History dump (JSON with `me`, `users` and `messages`)
    pub history: PathBuf,

    /// Chat to purge
    #[arg(long, allow_negative_numbers = true)]
    pub chat: i64,

    /// Sender user or channel id to target (repeatable)
    #[arg(long, value_name = "ID", allow_negative_numbers = true)]
    pub from: Vec<i64>,

    /// Target every sender
    #[arg(long)]
    pub all: bool,

    /// Only delete messages matching this regex
    #[arg(short, long, value_name = "REGEX")]
    pub keyword: Option<String>,

    /// Skip this many matching messages first
    #[arg(short, long, default_value_t = 0)]
    pub offset: usize,

    /// Stop at messages older than this span ago (e.g. 3d4h)
    #[arg(long, value_name = "SPAN")]
    pub before: Option<String>,

    /// Only consider messages older than this span ago
    #[arg(long, value_name = "SPAN")]
    pub after: Option<String>,

    /// Number of messages to delete
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Do not bound the scan
    #[arg(long)]
    pub full: bool,

    /// Reference time for spans (RFC 3339, default: now)
    #[arg(long, value_name = "TIME")]
    pub now: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_censor_negative_chat() {
        let args = Args::try_parse_from(["chatmod", "state", "censor", "-100", "1", "2"]).unwrap();
        match args.command {
            CliCommand::State(StateArgs {
                action: StateAction::Censor { chat, users },
                state,
            }) => {
                assert_eq!(chat, -100);
                assert_eq!(users, vec![1, 2]);
                assert_eq!(state, PathBuf::from("data/censoring.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_purge() {
        let args = Args::try_parse_from([
            "chatmod", "purge", "h.json", "--chat", "-5", "--from", "7", "--from", "8", "-n", "3",
            "-k", "spam", "--full",
        ])
        .unwrap();
        let CliCommand::Purge(purge) = args.command else {
            panic!("expected purge");
        };
        assert_eq!(purge.chat, -5);
        assert_eq!(purge.from, vec![7, 8]);
        assert_eq!(purge.count, 3);
        assert_eq!(purge.keyword.as_deref(), Some("spam"));
        assert!(purge.full);
        assert_eq!(purge.offset, 0);
    }

    #[test]
    fn test_censor_requires_users() {
        assert!(Args::try_parse_from(["chatmod", "state", "censor", "-100"]).is_err());
    }
}
