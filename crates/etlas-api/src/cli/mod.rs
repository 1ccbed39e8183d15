//! CLI command definitions for the `etlas` binary.
//!
//! Uses clap derive macros for argument parsing. Resources are nouns with
//! verb subcommands (e.g., `etlas chat create`, `etlas scheme list`); the
//! everyday actions (`send`, `messages`) are top-level.

pub mod chat;
pub mod message;
pub mod prompt;
pub mod scheme;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// ETL assistant: chat about database schemas and get runnable ETL code.
#[derive(Parser)]
#[command(name = "etlas", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true, hide = true)]
    pub otel: bool,

    /// Data directory holding config.toml and etlas.db.
    #[arg(long, global = true, env = "ETLAS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a message to a chat and print the assistant's reply.
    Send {
        /// Chat to post into.
        #[arg(long)]
        chat: Uuid,

        /// Message text.
        text: String,

        /// Attach a file reference, as `url=filename`. Repeatable.
        #[arg(long = "attach", value_name = "URL=FILENAME", value_parser = parse_attachment)]
        attachments: Vec<(String, String)>,
    },

    /// Show a page of a chat's messages, oldest first.
    Messages {
        /// Chat to read.
        chat: Uuid,

        #[arg(long, default_value = "0")]
        skip: u64,

        #[arg(long, default_value = "20")]
        limit: u64,
    },

    /// Manage chats (create, list, show).
    Chat {
        #[command(subcommand)]
        action: chat::ChatCommand,
    },

    /// Manage database schemas (create, list).
    Scheme {
        #[command(subcommand)]
        action: scheme::SchemeCommand,
    },

    /// Manage users (create, show).
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// Print the rendered system prompt.
    Prompt {
        /// Append this scheme's content as the database schema.
        #[arg(long)]
        scheme: Option<Uuid>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Parse an `--attach` value of the form `url=filename`.
///
/// The split happens at the last `=`, so URLs with query strings survive.
pub fn parse_attachment(raw: &str) -> Result<(String, String), String> {
    let (url, filename) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected URL=FILENAME, got '{raw}'"))?;
    if url.trim().is_empty() || filename.trim().is_empty() {
        return Err(format!("expected URL=FILENAME, got '{raw}'"));
    }
    Ok((url.trim().to_string(), filename.trim().to_string()))
}

/// Shorten `text` to at most `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() <= max {
        return text;
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
