//! Help text for the moderation commands.

use super::args::{CENSOR, CommandSpec, FREE, PURGE};

/// Category the commands are listed under.
pub const CATEGORY: &str = "MODERATION";

/// One help entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpEntry {
    pub spec: &'static CommandSpec,
    pub summary: &'static str,
    pub description: &'static str,
    pub args: &'static str,
    /// Whether the command is listed to non-owners.
    pub public: bool,
}

impl HelpEntry {
    /// Renders `name (aliases) args: summary`.
    pub fn short(&self) -> String {
        let names = self.spec.names;
        let aliases = if names.len() > 1 {
            format!(" ({})", names[1..].join(", "))
        } else {
            String::new()
        };
        format!("{}{} {} : {}", names[0], aliases, self.args, self.summary)
    }
}

pub static ENTRIES: [HelpEntry; 3] = [
    HelpEntry {
        spec: &CENSOR,
        summary: "immediately delete messages",
        description: "Start censoring someone in current chat. Use flag `-mass` to toggle mass \
            censorship in current chat. Users made immune (`free` cmd) will not be affected by \
            mass censoring, use flag `-i` to revoke immunity from someone. Use flag `-list` to \
            get censored users in current chat. Messages from self will never be censored. More \
            than one target can be specified. To free someone from censorship, use `.free` \
            command. Instead of specifying targets, you can reply to someone.",
        args: "[-list] [-mass] [-i] <targets>",
        public: true,
    },
    HelpEntry {
        spec: &FREE,
        summary: "stop censoring someone",
        description: "Stop censoring someone in current chat. Use flag `-mass` to stop mass \
            censorship current chat. You can add `-i` to make target immune to mass censoring. \
            More than one target can be specified (separate with spaces). Add `-list` flag to \
            list immune users (censor immunity is global but doesn't bypass specific \
            censorship). Instead of specifying targets, you can reply to someone.",
        args: "[-list] [-mass] [-i] <targets>",
        public: true,
    },
    HelpEntry {
        spec: &PURGE,
        summary: "batch delete messages",
        description: "Delete last <n> messages (excluding this) sent by <targets> (can be a list \
            of `@user`). If <n> is not given, will default to 1. If no target is given, messages \
            from author of replied msg or self msgs will be deleted. You can give flag `-all` to \
            delete from everyone. Search is limited to last 100 messages by default, add the \
            `-full` flag to make an unbound (and maybe long, be careful!) search. A keyword \
            (regex) can be specified (`-k`) so that only messages matching given pattern will \
            be deleted. An offset can be specified with `-o`, to start deleting after a specific \
            number of messages. A time frame can be given: you can limit deletion to messages \
            before (`-before`) a certain time (all messages from now up to <time> ago), or after \
            (`-after`) a certain interval (all messages older than <time>). Time can be given as \
            a packed string like this : `8y3d4h15m3s` (years, days, hours, minutes, seconds), \
            any individual token can be given in any position and all are optional, it can just \
            be `30s` or `5m`. If you want to include spaces, wrap the 'time' string in `\"`. If \
            you need to purge messages from an user without an @username, you can give its user \
            id with the `-id` flag. If you need to provide more than 1 id, wrap them in `\"` and \
            separate with a space. Use `-g` to purge in another chat.",
        args: "[-k <keyword>] [-o <n>] [-before <time>] [-after <time>] [-all] [-id <ids>] \
            [-g <chat>] [<targets>] [<number>] [-full]",
        public: false,
    },
];

/// Looks up the help entry for a command name or alias.
pub fn find(name: &str) -> Option<&'static HelpEntry> {
    ENTRIES
        .iter()
        .find(|e| e.spec.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
}
