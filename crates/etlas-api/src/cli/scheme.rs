//! Scheme CLI commands: register a database schema, list a user's schemas.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use etlas_types::scheme::SchemeCreate;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum SchemeCommand {
    /// Register a schema from a file (DDL, data dictionary, ...).
    Create {
        #[arg(long)]
        user: Uuid,

        #[arg(long)]
        title: String,

        /// File whose text becomes the scheme content.
        #[arg(long)]
        file: PathBuf,

        /// Where the original file is hosted, if anywhere.
        #[arg(long)]
        attachment_url: Option<String>,
    },

    /// List a user's schemes.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        user: Uuid,
    },
}

pub async fn run(state: &AppState, command: SchemeCommand, json: bool) -> Result<()> {
    match command {
        SchemeCommand::Create {
            user,
            title,
            file,
            attachment_url,
        } => create_scheme(state, user, title, file, attachment_url, json).await,
        SchemeCommand::List { user } => list_schemes(state, user, json).await,
    }
}

async fn create_scheme(
    state: &AppState,
    user: Uuid,
    title: String,
    file: PathBuf,
    attachment_url: Option<String>,
    json: bool,
) -> Result<()> {
    let content = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    if content.trim().is_empty() {
        bail!("{} is empty", file.display());
    }
    if title.trim().is_empty() {
        bail!("--title must not be empty");
    }

    let scheme = state
        .scheme_service
        .create(&SchemeCreate {
            title,
            content,
            user_id: user,
            attachment_url,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scheme)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Scheme '{}' saved",
        style("✓").green().bold(),
        style(&scheme.title).cyan()
    );
    println!("  {}  {}", style("ID:").bold(), scheme.id);
    println!(
        "  {}  {} lines",
        style("Size:").bold(),
        scheme.content.lines().count()
    );
    println!();
    println!(
        "  Chat about it: {}",
        style(format!("etlas chat create --user {user} --scheme {}", scheme.id)).yellow()
    );
    println!();

    Ok(())
}

async fn list_schemes(state: &AppState, user: Uuid, json: bool) -> Result<()> {
    let schemes = state.scheme_service.list_by_user(user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schemes)?);
        return Ok(());
    }

    if schemes.is_empty() {
        println!();
        println!(
            "  {} No schemes found. Add one with: {}",
            style("i").blue().bold(),
            style(format!(
                "etlas scheme create --user {user} --title <title> --file <path>"
            ))
            .yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Preview").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for scheme in &schemes {
        table.add_row(vec![
            Cell::new(scheme.id).fg(Color::Cyan),
            Cell::new(&scheme.title),
            Cell::new(crate::cli::truncate(&scheme.content, 50)).fg(Color::DarkGrey),
            Cell::new(scheme.created_at.format("%Y-%m-%d")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} scheme{}",
        style(schemes.len()).bold(),
        if schemes.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
