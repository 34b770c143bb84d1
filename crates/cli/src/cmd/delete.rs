//! Delete a checkpoint

use crate::util::{self, Env};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub async fn run(env: Env, checkpoint_ref: String, yes: bool) -> Result<()> {
    // 1. Resolve the reference and count the children that will move
    let lookup_env = env.clone();
    let (checkpoint, children) = util::blocking(move || {
        let manager = lookup_env.manager()?;
        let checkpoint = util::resolve_checkpoint_ref(&manager, &checkpoint_ref)?;
        let children = manager
            .store()
            .get(None)
            .iter()
            .filter(|c| c.parent_checkpoint_id.as_deref() == Some(checkpoint.checkpoint_id.as_str()))
            .count();
        Ok((checkpoint, children))
    })
    .await?;

    println!("Checkpoint: {}", util::display_checkpoint_compact(&checkpoint));
    if children > 0 {
        let new_parent = checkpoint
            .parent_checkpoint_id
            .as_deref()
            .map(bp_journal::checkpoint::short_id)
            .unwrap_or_else(|| "(root)".to_string());
        println!(
            "{} {} children will be re-parented to {}",
            "Note:".yellow(),
            children,
            new_parent
        );
    }

    // 2. Confirm
    if !yes && !util::confirm("Delete this checkpoint?")? {
        println!("{}", "Aborted".dimmed());
        return Ok(());
    }

    // 3. Delete
    let id = checkpoint.checkpoint_id.clone();
    let deleted = util::blocking(move || {
        let manager = env.manager()?;
        manager.delete(&id).context("Failed to delete checkpoint")
    })
    .await?;

    if deleted {
        println!("{} Deleted checkpoint {}", "✓".green(), checkpoint.short_id().yellow());
    } else {
        println!("{}", "Checkpoint was already gone".dimmed());
    }

    Ok(())
}
