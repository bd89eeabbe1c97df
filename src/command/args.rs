//! Command tokenizing.
//!
//! A command line such as `.purge @alice 5 -k "free money" -full` is split into
//! positional arguments, declared flags and declared options. Double quotes
//! group words into one token.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::error::{ModError, Result};

/// Shape of one command: its names and the flags/options it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Primary name first, then aliases.
    pub names: &'static [&'static str],
    /// Boolean switches, e.g. `-list`.
    pub flags: &'static [&'static str],
    /// Canonical option name and the spellings that introduce it.
    pub options: &'static [(&'static str, &'static [&'static str])],
}

pub const CENSOR: CommandSpec = CommandSpec {
    names: &["censor", "c"],
    flags: &["-list", "-i", "-mass"],
    options: &[],
};

pub const FREE: CommandSpec = CommandSpec {
    names: &["free", "f", "stop"],
    flags: &["-list", "-i", "-mass"],
    options: &[],
};

pub const PURGE: CommandSpec = CommandSpec {
    names: &["purge", "wipe", "clear"],
    flags: &["-all", "-full"],
    options: &[
        ("keyword", &["-k", "-keyword"]),
        ("offset", &["-o", "-offset"]),
        ("ids", &["-id"]),
        ("before", &["-before"]),
        ("after", &["-after"]),
        ("group", &["-g", "-group"]),
        ("limit", &["-lim"]),
    ],
};

impl CommandSpec {
    pub fn name(&self) -> &'static str {
        self.names[0]
    }

    fn option_for(&self, token: &str) -> Option<&'static str> {
        self.options
            .iter()
            .find(|(_, spellings)| spellings.contains(&token))
            .map(|(name, _)| *name)
    }
}

/// A tokenized command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    pub positional: Vec<String>,
    pub flags: BTreeSet<String>,
    pub options: BTreeMap<String, String>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text` as an invocation of `spec`.
    ///
    /// Returns `None` when the text does not start with one of `prefixes`
    /// followed by one of the command's names.
    ///
    /// ```
    /// use chatmod::command::args::{CommandArgs, PURGE};
    ///
    /// let args = CommandArgs::parse(r#".wipe @bob 3 -k "a b" -full"#, &["."], &PURGE).unwrap();
    /// assert_eq!(args.positional, vec!["@bob", "3"]);
    /// assert!(args.has_flag("-full"));
    /// assert_eq!(args.option("keyword"), Some("a b"));
    /// ```
    pub fn parse<P: AsRef<str>>(text: &str, prefixes: &[P], spec: &CommandSpec) -> Option<Self> {
        let mut tokens = tokenize(text).into_iter();
        let head = tokens.next()?;
        let name = prefixes
            .iter()
            .find_map(|p| head.strip_prefix(p.as_ref()))?;
        if !spec.names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            return None;
        }

        let mut args = Self::new();
        while let Some(token) = tokens.next() {
            if spec.flags.contains(&token.as_str()) {
                args.flags.insert(token);
            } else if let Some(option) = spec.option_for(&token) {
                match tokens.next() {
                    Some(value) => {
                        args.options.insert(option.to_string(), value);
                    }
                    None => args.positional.push(token),
                }
            } else {
                args.positional.push(token);
            }
        }
        Some(args)
    }

    #[must_use]
    pub fn with_positional(mut self, arg: impl Into<String>) -> Self {
        self.positional.push(arg.into());
        self
    }

    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Parses an option value, failing with [`ModError::InvalidArgument`].
    pub fn parsed_option<T: FromStr>(&self, name: &'static str) -> Result<Option<T>> {
        self.option(name)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| ModError::invalid_argument(name, raw))
            })
            .transpose()
    }

    /// Target specifiers, without framework flags that leak into positionals.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.positional
            .iter()
            .map(String::as_str)
            .filter(|t| *t != "-delme")
    }
}

/// Splits on whitespace, keeping double-quoted runs together.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in text.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        tokens.push(current);
    }
    tokens
}
