//! Message commands: send a message through the assistant, page a chat's history.

use anyhow::{Result, bail};
use console::style;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use etlas_core::service::SendMessage;
use etlas_types::attachment::NewAttachment;
use etlas_types::error::MessageError;
use etlas_types::message::{Message, MessageContent};

use crate::state::AppState;

/// Send `text` to a chat and print the assistant reply.
///
/// Ctrl+C cancels a pending completion or retry wait; messages already
/// stored stay stored.
pub async fn send(
    state: &AppState,
    chat_id: Uuid,
    text: String,
    attachments: Vec<(String, String)>,
    json: bool,
) -> Result<()> {
    let service = state.message_service()?;

    let request = attachments.into_iter().fold(
        SendMessage::user(chat_id, text),
        |request, (url, filename)| request.with_attachment(NewAttachment::new(url, filename)),
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if !json {
        eprintln!("  {}", style("Thinking...").dim());
    }

    let reply = match service.send_message(request, cancel).await {
        Ok(reply) => reply,
        Err(MessageError::NotFound(what)) => bail!("{what} {chat_id} not found"),
        Err(MessageError::AttachmentNotCreated { message_id, source }) => bail!(
            "message {message_id} was stored but an attachment failed: {source}"
        ),
        Err(err) => return Err(err.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!();
    print_message(&reply);
    Ok(())
}

/// Print one page of a chat's messages.
pub async fn list(state: &AppState, chat_id: Uuid, skip: u64, limit: u64, json: bool) -> Result<()> {
    let page = state.messages.get_by_chat_id(chat_id, skip, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.data.is_empty() {
        println!();
        println!(
            "  {} No messages. Start with: {}",
            style("i").blue().bold(),
            style(format!("etlas send --chat {chat_id} \"...\"")).yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    for message in &page.data {
        print_message(message);
    }
    println!(
        "  {} of {} message{}",
        style(format!("{}-{}", skip + 1, skip + page.data.len() as u64)).bold(),
        page.total,
        if page.total == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Styled rendering of one message.
pub fn print_message(message: &Message) {
    let stamp = message.created_at.format("%Y-%m-%d %H:%M");
    match &message.content {
        MessageContent::User(user) => {
            println!(
                "  {} {}",
                style("You").cyan().bold(),
                style(stamp).dim()
            );
            println!("  {}", user.text);
            for attachment in &message.attachments {
                println!(
                    "    {} {} {}",
                    style("📎").dim(),
                    attachment.filename,
                    style(&attachment.url).dim()
                );
            }
        }
        MessageContent::Ai(ai) => {
            println!(
                "  {} {}",
                style("Etlas").magenta().bold(),
                style(stamp).dim()
            );
            if ai.is_empty() {
                println!("  {}", style("(empty reply)").dim());
            }
            let sections = [
                ("Analysis", &ai.analysis),
                ("Comment", &ai.comment),
                ("Code", &ai.code),
                ("Executable code", &ai.executable_code),
            ];
            for (label, body) in sections {
                let Some(body) = body.as_deref().filter(|body| !body.trim().is_empty()) else {
                    continue;
                };
                println!("  {}", style(label).bold());
                for line in body.lines() {
                    println!("    {line}");
                }
            }
        }
    }
    println!();
}
