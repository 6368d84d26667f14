//! `history` command handler.

use anyhow::Result;
use jarvis_core::domain::{Message, MessageRole, Turn};
use jarvis_core::events::BackendEvent;
use jarvis_session::ReconcileOutcome;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::history_commands::HistoryCommand;
use crate::presentation::{print_message, print_separator, truncate_string};

pub async fn execute(ctx: &mut CliContext, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List => {
            list(ctx);
            Ok(())
        }
        HistoryCommand::New => {
            let id = ctx.session.new_conversation().await?;
            println!("{id}");
            Ok(())
        }
        HistoryCommand::Show { conversation } => show(ctx, &conversation).await,
        HistoryCommand::Append {
            conversation,
            role,
            content,
        } => append(ctx, &conversation, role.into(), content).await,
        HistoryCommand::Rename {
            conversation,
            title,
            generate,
        } => rename(ctx, &conversation, title, generate).await,
        HistoryCommand::Delete { conversation } => {
            let id = ctx.resolve_conversation(&conversation)?;
            ctx.session.delete_conversation(&id).await?;
            println!("✓ Deleted {id}");
            Ok(())
        }
    }
}

fn list(ctx: &CliContext) {
    let history = ctx.session.history();
    let active = ctx.session.active_conversation();

    println!("{:<4} {:<40} Started", "#", "Title");
    print_separator(66);
    for (index, id) in history.iter().enumerate() {
        let marker = if Some(id) == active { '*' } else { ' ' };
        println!(
            "{marker}{:<3} {:<40} {}",
            index + 1,
            truncate_string(id.title(), 39),
            id.timestamp_stem().unwrap_or("--")
        );
    }
}

async fn show(ctx: &mut CliContext, conversation: &str) -> Result<()> {
    let id = ctx.resolve_conversation(conversation)?;
    ctx.session.select_conversation(&id).await?;

    println!("{id}");
    print_separator(66);
    let messages = ctx.session.messages();
    if messages.is_empty() {
        println!("(no messages)");
    }
    for message in messages {
        print_message(message);
    }
    Ok(())
}

/// Publish the turn as a backend `new-message` so it takes the same
/// reconciliation path, including automatic titling.
async fn append(
    ctx: &mut CliContext,
    conversation: &str,
    role: MessageRole,
    content: String,
) -> Result<()> {
    if content.trim().is_empty() {
        return Err(CliError::Arguments("content is empty".to_string()).into());
    }
    let id = ctx.resolve_conversation(conversation)?;
    ctx.session.select_conversation(&id).await?;

    let message = Message::from(Turn::new(role, content, ctx.clock.now_millis()));
    ctx.publisher().publish(BackendEvent::NewMessage(message.into()));

    for outcome in ctx.drain().await {
        if let ReconcileOutcome::Dropped(reason) = outcome {
            return Err(CliError::Session(format!("message was not recorded: {reason:?}")).into());
        }
    }

    if let Some(active) = ctx.session.active_conversation() {
        println!("✓ Appended to {active}");
    }
    Ok(())
}

async fn rename(
    ctx: &mut CliContext,
    conversation: &str,
    title: Option<String>,
    generate: bool,
) -> Result<()> {
    let id = ctx.resolve_conversation(conversation)?;
    let result = match title {
        Some(title) if !generate => ctx.session.rename_conversation(&id, &title).await?,
        _ => ctx.session.generate_and_rename_conversation(&id).await?,
    };
    println!("✓ Renamed to {}", result.new_id);
    Ok(())
}
