//! Show diff between the conversations of two checkpoints

use crate::diff_utils;
use crate::util::{self, Env};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

pub async fn run(
    env: Env,
    checkpoint_a: String,
    checkpoint_b: String,
    context: Option<usize>,
    preview: Option<usize>,
) -> Result<()> {
    // 1. Diff options from config, overridden by flags
    let mut options = env.config.diff_options();
    if let Some(context) = context {
        options.context_lines = context;
    }
    if let Some(preview) = preview {
        anyhow::ensure!(preview > 0, "--preview must be at least 1");
        options.preview_chars = preview;
    }

    // 2. Resolve both references and compute the diff
    let (cp_a, cp_b, lines) = util::blocking(move || {
        let manager = env.manager()?;
        let cp_a = util::resolve_checkpoint_ref(&manager, &checkpoint_a)?;
        let cp_b = util::resolve_checkpoint_ref(&manager, &checkpoint_b)?;
        let lines = manager.diff(&cp_a.checkpoint_id, &cp_b.checkpoint_id, &options)?;
        Ok((cp_a, cp_b, lines))
    })
    .await?;

    // 3. Display
    println!("{}", "Diff Summary".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("From: {}", util::display_checkpoint_compact(&cp_a));
    println!("To:   {}", util::display_checkpoint_compact(&cp_b));
    println!();

    if lines.is_empty() {
        println!("{}", "No changes between checkpoints".dimmed());
        return Ok(());
    }

    let (added, removed) = diff_utils::diff_stats(&lines);
    println!(
        "{} messages added, {} removed",
        added.to_string().green(),
        removed.to_string().red()
    );
    println!();

    let color = std::io::stdout().is_terminal();
    print!("{}", diff_utils::render_unified_diff(&lines, color));

    Ok(())
}
