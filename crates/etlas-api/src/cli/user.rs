//! User CLI commands: create, show.

use anyhow::{Result, bail};
use clap::Subcommand;
use console::style;

use etlas_types::user::{User, UserCreate};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user.
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Look a user up by email.
    Show { email: String },
}

pub async fn run(state: &AppState, command: UserCommand, json: bool) -> Result<()> {
    match command {
        UserCommand::Create { name, email } => {
            let input = UserCreate::new(name, email)?;
            let user = state.user_service.create(&input).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
                return Ok(());
            }
            println!();
            println!("  {} User created", style("✓").green().bold());
            print_user(&user);
            Ok(())
        }
        UserCommand::Show { email } => {
            let Some(user) = state.user_service.get_by_email(&email).await? else {
                bail!("no user with email {email}");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
                return Ok(());
            }
            print_user(&user);
            Ok(())
        }
    }
}

fn print_user(user: &User) {
    let verified = match user.email_verified {
        Some(true) => style("verified").green(),
        Some(false) => style("unverified").yellow(),
        None => style("unknown").dim(),
    };
    println!();
    println!("  {}     {}", style("Name:").bold(), style(&user.name).cyan());
    println!("  {}    {} ({verified})", style("Email:").bold(), user.email);
    println!("  {}       {}", style("ID:").bold(), style(user.id).dim());
    println!(
        "  {}  {}",
        style("Created:").bold(),
        user.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();
}
