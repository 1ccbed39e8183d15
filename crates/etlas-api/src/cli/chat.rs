//! Chat CLI commands: create, list, show.

use anyhow::{Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use etlas_types::chat::{Chat, ChatCreate};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum ChatCommand {
    /// Open a new chat, optionally grounded on a scheme.
    Create {
        #[arg(long)]
        user: Uuid,

        /// Scheme whose content is sent as the database schema.
        #[arg(long)]
        scheme: Option<Uuid>,
    },

    /// List a user's chats.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        user: Uuid,

        #[arg(long, default_value = "0")]
        skip: u64,

        #[arg(long, default_value = "20")]
        limit: u64,
    },

    /// Show one chat.
    Show { id: Uuid },
}

pub async fn run(state: &AppState, command: ChatCommand, json: bool) -> Result<()> {
    match command {
        ChatCommand::Create { user, scheme } => create_chat(state, user, scheme, json).await,
        ChatCommand::List { user, skip, limit } => list_chats(state, user, skip, limit, json).await,
        ChatCommand::Show { id } => show_chat(state, id, json).await,
    }
}

async fn create_chat(state: &AppState, user: Uuid, scheme: Option<Uuid>, json: bool) -> Result<()> {
    if state.user_service.get(user).await?.is_none() {
        bail!("user {user} not found");
    }
    if let Some(scheme) = scheme {
        if state.scheme_service.get(scheme).await?.is_none() {
            bail!("scheme {scheme} not found");
        }
    }

    let chat = state.chat_service.create(&ChatCreate::new(user, scheme)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chat)?);
        return Ok(());
    }

    println!();
    println!("  {} Chat created", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("ID:").bold(), style(chat.id).cyan());
    if let Some(scheme) = chat.scheme_id {
        println!("  {}  {}", style("Scheme:").bold(), scheme);
    }
    println!();
    println!(
        "  Start talking: {}",
        style(format!("etlas send --chat {} \"...\"", chat.id)).yellow()
    );
    println!();

    Ok(())
}

async fn list_chats(state: &AppState, user: Uuid, skip: u64, limit: u64, json: bool) -> Result<()> {
    let page = state.chat_service.list_by_user(user, skip, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.data.is_empty() {
        println!();
        println!(
            "  {} No chats found. Create one with: {}",
            style("i").blue().bold(),
            style(format!("etlas chat create --user {user}")).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Scheme").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for chat in &page.data {
        table.add_row(vec![
            Cell::new(chat.id).fg(Color::Cyan),
            name_cell(chat),
            Cell::new(
                chat.scheme_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
            .fg(Color::DarkGrey),
            Cell::new(chat.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  page {} of {}, {} chat{}",
        style(skip / limit.max(1) + 1).bold(),
        page.pages.max(1),
        style(page.total).bold(),
        if page.total == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

async fn show_chat(state: &AppState, id: Uuid, json: bool) -> Result<()> {
    let Some(chat) = state.chat_service.get(id).await? else {
        bail!("chat {id} not found");
    };
    let messages = state.messages.get_by_chat_id(id, 0, 1).await?;

    if json {
        let detail = serde_json::json!({
            "chat": chat,
            "message_count": messages.total,
        });
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!();
    println!(
        "  {}",
        style(chat.name_chat.as_deref().unwrap_or("(untitled chat)")).cyan().bold()
    );
    println!();
    println!("  {}       {}", style("ID:").bold(), chat.id);
    println!("  {}     {}", style("User:").bold(), chat.user_id);
    if let Some(scheme_id) = chat.scheme_id {
        let title = state
            .scheme_service
            .get(scheme_id)
            .await?
            .map(|scheme| scheme.title)
            .unwrap_or_else(|| "(missing)".to_string());
        println!("  {}   {} {}", style("Scheme:").bold(), title, style(scheme_id).dim());
    }
    println!(
        "  {}  {}",
        style("Created:").bold(),
        chat.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  {} {}", style("Messages:").bold(), messages.total);
    println!();

    Ok(())
}

fn name_cell(chat: &Chat) -> Cell {
    match &chat.name_chat {
        Some(name) => Cell::new(crate::cli::truncate(name, 40)),
        None => Cell::new("(untitled)").fg(Color::DarkGrey),
    }
}
