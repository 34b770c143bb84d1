//! Restore a session log to a checkpoint

use crate::util::{self, Env};
use anyhow::{Context, Result};
use bp_core::backup_path_for;
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub async fn run(env: Env, checkpoint_ref: String, to: Option<PathBuf>, yes: bool) -> Result<()> {
    // 1. Resolve the checkpoint and the live log it replaces
    let lookup_env = env.clone();
    let (checkpoint, live) = util::blocking(move || {
        let manager = lookup_env.manager()?;
        let checkpoint = util::resolve_checkpoint_ref(&manager, &checkpoint_ref)?;
        if !manager.store().has_snapshot(&checkpoint.checkpoint_id) {
            anyhow::bail!(
                "Checkpoint {} has no snapshot to restore",
                checkpoint.short_id()
            );
        }
        let live = match to {
            Some(path) => path,
            None => lookup_env
                .locator()
                .find(&checkpoint.session_id)
                .map(|s| s.path)
                .with_context(|| {
                    format!(
                        "Session log for {} not found under {}; pass --to",
                        checkpoint.session_id,
                        lookup_env.projects_dir.display()
                    )
                })?,
        };
        Ok((checkpoint, live))
    })
    .await?;

    println!("Checkpoint: {}", util::display_checkpoint_compact(&checkpoint));
    println!("Target:     {}", live.display());

    // 2. Confirm
    if !yes && !util::confirm("Overwrite the session log with this checkpoint?")? {
        println!("{}", "Aborted".dimmed());
        return Ok(());
    }

    // 3. Restore
    let spinner = util::spinner("Restoring session log...");
    let id = checkpoint.checkpoint_id.clone();
    let target = live.clone();
    let restored = util::blocking(move || {
        let manager = env.manager()?;
        manager.restore(&id, &target).context("Failed to restore checkpoint")
    })
    .await;
    spinner.finish_and_clear();

    if !restored? {
        anyhow::bail!("Checkpoint {} disappeared before it could be restored", checkpoint.short_id());
    }

    println!("{} Restored {} to {}", "✓".green(), live.display(), checkpoint.short_id().yellow());
    let backup = backup_path_for(&live);
    if backup.exists() {
        println!("  {} {}", "backup".dimmed(), backup.display());
    }

    Ok(())
}
