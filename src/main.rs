//! # chatmod CLI
//!
//! Offline tooling for the chatmod library.

use std::fs;
use std::process;

use chrono::{DateTime, Utc};
use clap::Parser as ClapParser;
use regex::Regex;
use tracing_subscriber::EnvFilter;

use chatmod::cli::{Args, CliCommand, PurgeArgs, StateAction, StateArgs};
use chatmod::client::{ChatClient, MemoryChatClient};
use chatmod::client::memory::HistoryDump;
use chatmod::command::help::{CATEGORY, ENTRIES};
use chatmod::core::{
    CensorshipState, JsonStateStore, PurgeRequest, StateStore, purge, span_before,
};
use chatmod::message::{ChatId, UserId};
use chatmod::{ModError, Result};

#[tokio::main]
async fn main() {
    let args = <Args as ClapParser>::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        CliCommand::State(state) => run_state(&state),
        CliCommand::Purge(purge_args) => run_purge(&purge_args).await,
        CliCommand::Commands => {
            print_commands();
            Ok(())
        }
    }
}

fn run_state(args: &StateArgs) -> Result<()> {
    let store = JsonStateStore::new(&args.state);

    if matches!(args.action, StateAction::Show) {
        print_state(&store.load());
        return Ok(());
    }

    // Refuse to overwrite a snapshot we could not read.
    let mut state = if store.path().exists() {
        store.try_load()?
    } else {
        CensorshipState::new()
    };

    let changed = match &args.action {
        StateAction::Show => false,
        StateAction::Censor { chat, users } => users
            .iter()
            .fold(false, |acc, &u| state.censor_specific(ChatId(*chat), UserId(u)) | acc),
        StateAction::Free { chat, users } => users
            .iter()
            .fold(false, |acc, &u| state.free_specific(ChatId(*chat), UserId(u)) | acc),
        StateAction::Mass { chat } => state.enable_mass(ChatId(*chat)),
        StateAction::Unmass { chat } => state.disable_mass(ChatId(*chat)),
        StateAction::Immune { users } => users
            .iter()
            .fold(false, |acc, &u| state.grant_immunity(UserId(u)) | acc),
        StateAction::Revoke { users } => users
            .iter()
            .fold(false, |acc, &u| state.revoke_immunity(UserId(u)) | acc),
    };

    if changed {
        store.save(&state)?;
        println!("✅ Saved {}", store.path().display());
    } else {
        println!("⏭️  Nothing changed");
    }
    Ok(())
}

fn print_state(state: &CensorshipState) {
    let join = |ids: Vec<String>| {
        if ids.is_empty() {
            "-".to_string()
        } else {
            ids.join(", ")
        }
    };

    println!(
        "📢 Mass:     {}",
        join(state.mass().iter().map(ToString::to_string).collect())
    );
    println!(
        "🛡️  Immune:   {}",
        join(state.immune().iter().map(ToString::to_string).collect())
    );
    if state.specific().is_empty() {
        println!("🔇 Specific: -");
    }
    for (chat, users) in state.specific() {
        println!(
            "🔇 {}: {}",
            chat,
            join(users.iter().map(ToString::to_string).collect())
        );
    }
}

async fn run_purge(args: &PurgeArgs) -> Result<()> {
    if args.from.is_empty() && !args.all {
        return Err(ModError::invalid_argument("from", "<none> (use --from or --all)"));
    }

    let content = fs::read_to_string(&args.history)?;
    let dump: HistoryDump = serde_json::from_str(&content)?;
    let client = MemoryChatClient::from_dump(dump);
    let chat = ChatId(args.chat);
    if client.get_chat(&chat.to_string()).await?.is_none() {
        return Err(ModError::not_found(format!("chat {}", chat)));
    }

    let now = match args.now {
        Some(ref raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| ModError::invalid_argument("now", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let mut request = PurgeRequest::new(chat)
        .with_delete_all(args.all)
        .with_offset(args.offset)
        .with_count(args.count)
        .with_hard_limit(!args.full);
    request.targets.extend(args.from.iter().copied());

    if let Some(ref pattern) = args.keyword {
        request = request.with_keyword(Regex::new(pattern)?);
    }
    if let Some(ref span) = args.before {
        request = request.with_before(span_before(now, span)?);
    }
    if let Some(ref span) = args.after {
        request = request.with_after(span_before(now, span)?);
    }

    println!("🧹 chatmod v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📖 History: {}", args.history.display());
    println!("💬 Chat:    {}", request.chat);
    println!("🔢 Count:   {}", request.count);
    println!();

    let report = purge(&client, &request).await?;

    for id in &report.deleted {
        println!("   would delete #{}", id);
    }
    println!();
    println!(
        "✅ {} deleted, {} scanned, {} skipped by offset (stop: {:?})",
        report.deleted.len(),
        report.scanned,
        report.skipped.len(),
        report.stop
    );
    Ok(())
}

fn print_commands() {
    println!("{}", CATEGORY);
    for entry in &ENTRIES {
        println!();
        println!("  {}", entry.short());
        println!("    {}", entry.description);
        if !entry.public {
            println!("    (owner only)");
        }
    }
}
