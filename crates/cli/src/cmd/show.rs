//! Show checkpoint details

use crate::util::{self, Env};
use anyhow::Result;
use bp_core::{Content, LogRecord};
use owo_colors::OwoColorize;

const PREVIEW_CHARS: usize = 100;

/// Show detailed information about a checkpoint and its trailing messages
pub async fn run(env: Env, checkpoint_ref: String, last: usize) -> Result<()> {
    let (checkpoint, has_snapshot, messages) = util::blocking(move || {
        let manager = env.manager()?;
        let checkpoint = util::resolve_checkpoint_ref(&manager, &checkpoint_ref)?;
        let has_snapshot = manager.store().has_snapshot(&checkpoint.checkpoint_id);
        let messages = manager.messages(&checkpoint.checkpoint_id)?;
        Ok((checkpoint, has_snapshot, messages))
    })
    .await?;

    println!("{} {}", "checkpoint".yellow().bold(), checkpoint.checkpoint_id.cyan());
    println!("{} {}", "Name:      ".dimmed(), checkpoint.name.bold());
    if !checkpoint.description.is_empty() {
        println!("{} {}", "About:     ".dimmed(), checkpoint.description);
    }
    println!("{} {}", "Session:   ".dimmed(), checkpoint.session_id);
    println!("{} {}", "Message:   ".dimmed(), checkpoint.message_uuid);

    match &checkpoint.parent_checkpoint_id {
        Some(parent) => println!("{} {}", "Parent:    ".dimmed(), parent.cyan()),
        None => println!("{} {}", "Parent:    ".dimmed(), "(none - root checkpoint)".dimmed()),
    }
    println!("{} {}", "Branch:    ".dimmed(), checkpoint.branch_or_main());
    println!(
        "{} {} ({})",
        "Date:      ".dimmed(),
        util::format_absolute_time(checkpoint.timestamp),
        util::format_relative_time(checkpoint.timestamp).dimmed()
    );

    if !has_snapshot {
        println!("\n{}", "No snapshot: the session log did not exist when this checkpoint was created".yellow());
        return Ok(());
    }

    println!("\n{} ({} total)", "Messages:".bold(), messages.len());
    let skip = messages.len().saturating_sub(last);
    if skip > 0 {
        println!("  {} ({} earlier messages omitted)", "...".dimmed(), skip);
    }
    for record in &messages[skip..] {
        println!("  {}", format_message(record));
    }

    Ok(())
}

fn format_message(record: &LogRecord) -> String {
    let Some(message) = record.chat_message() else {
        return String::new();
    };
    let role = format!("[{}]", message.role);
    let role = if message.role == "user" {
        role.green().to_string()
    } else {
        role.blue().to_string()
    };

    match message.content {
        Content::Text(text) => {
            let first_line = text.lines().next().unwrap_or("");
            let mut preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
            if preview.len() < text.len() {
                preview.push_str("...");
            }
            format!("{} {}", role, preview)
        }
        Content::Structured(_) => format!("{} {}", role, "(structured content)".dimmed()),
    }
}
