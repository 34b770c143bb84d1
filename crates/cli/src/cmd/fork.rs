//! Fork a new session from a checkpoint

use crate::util::{self, Env};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

pub async fn run(
    env: Env,
    checkpoint_ref: String,
    session: Option<String>,
    dir: Option<PathBuf>,
    branch: String,
) -> Result<()> {
    let new_session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let spinner = util::spinner("Forking session...");
    let session_id = new_session_id.clone();
    let result = util::blocking(move || {
        // 1. Resolve the source checkpoint
        let manager = env.manager()?;
        let source = util::resolve_checkpoint_ref(&manager, &checkpoint_ref)?;

        // 2. New logs go next to the source session unless told otherwise
        let target_dir = match dir {
            Some(dir) => dir,
            None => env
                .locator()
                .find(&source.session_id)
                .and_then(|s| s.path.parent().map(|p| p.to_path_buf()))
                .with_context(|| {
                    format!(
                        "Project directory of session {} not found; pass --dir",
                        source.session_id
                    )
                })?,
        };

        // 3. Copy, re-tag and record
        let path = manager
            .fork(&source.checkpoint_id, &session_id, &target_dir, &branch)
            .context("Failed to fork checkpoint")?
            .with_context(|| format!("Checkpoint {} has no snapshot to fork", source.short_id()))?;
        Ok((source, path))
    })
    .await;
    spinner.finish_and_clear();
    let (source, path) = result?;

    println!(
        "{} Forked {} into session {}",
        "✓".green(),
        source.short_id().yellow(),
        new_session_id.cyan()
    );
    println!("  {} {}", "log".dimmed(), path.display());

    Ok(())
}
