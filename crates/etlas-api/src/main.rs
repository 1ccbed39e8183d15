//! Etlas CLI entry point.
//!
//! Binary name: `etlas`
//!
//! Parses CLI arguments, initializes settings, database and services, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    etlas_observe::init_tracing(cli.verbose, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "etlas", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(etlas_infra::config::resolve_data_dir);
    let state = AppState::init(data_dir).await?;

    let result = match cli.command {
        Commands::Send {
            chat,
            text,
            attachments,
        } => cli::message::send(&state, chat, text, attachments, cli.json).await,
        Commands::Messages { chat, skip, limit } => {
            cli::message::list(&state, chat, skip, limit, cli.json).await
        }
        Commands::Chat { action } => cli::chat::run(&state, action, cli.json).await,
        Commands::Scheme { action } => cli::scheme::run(&state, action, cli.json).await,
        Commands::User { action } => cli::user::run(&state, action, cli.json).await,
        Commands::Prompt { scheme } => cli::prompt::show_prompt(&state, scheme, cli.json).await,
        Commands::Completions { .. } => Ok(()),
    };

    state.close().await;
    etlas_observe::shutdown_tracing();
    result
}
