//! Create a checkpoint of a session

use crate::util::{self, Env};
use anyhow::{Context, Result};
use bp_core::last_message_uuid;
use bp_journal::CreateRequest;
use owo_colors::OwoColorize;

pub async fn run(
    env: Env,
    session: String,
    name: String,
    message: Option<String>,
    description: String,
    parent: Option<String>,
    branch: Option<String>,
) -> Result<()> {
    let checkpoint = util::blocking(move || {
        // 1. Locate the session log
        let session = env.session(&session)?;

        // 2. Pick the message to checkpoint at
        let message_uuid = match message {
            Some(uuid) => uuid,
            None => last_message_uuid(&session.path)?.with_context(|| {
                format!("Session {} has no user or assistant messages", session.session_id)
            })?,
        };

        // 3. Resolve the parent reference to a full ID
        let manager = env.manager()?;
        let parent_id = match parent {
            Some(reference) => Some(util::resolve_checkpoint_ref(&manager, &reference)?.checkpoint_id),
            None => None,
        };

        // 4. Snapshot and record
        let request = CreateRequest::new(
            session.session_id.clone(),
            session.path.clone(),
            message_uuid,
            name,
        )
        .description(description)
        .parent(parent_id)
        .branch(branch);

        manager.create(request).context("Failed to create checkpoint")
    })
    .await?;

    println!(
        "{} Created checkpoint {} {}",
        "✓".green(),
        checkpoint.checkpoint_id.yellow(),
        checkpoint.name.bold()
    );
    println!(
        "  {} {}  {} {}",
        "session".dimmed(),
        checkpoint.session_id,
        "message".dimmed(),
        checkpoint.message_uuid
    );

    Ok(())
}
