//! List checkpoints

use crate::util::{self, Env};
use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn run(env: Env, session: Option<String>) -> Result<()> {
    let mut checkpoints = util::blocking(move || {
        let manager = env.manager()?;
        Ok(manager.store().get(session.as_deref()))
    })
    .await?;

    if checkpoints.is_empty() {
        println!("{}", "No checkpoints".dimmed());
        return Ok(());
    }

    checkpoints.sort_by(|a, b| {
        a.session_id
            .cmp(&b.session_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    println!("{} ({})", "Checkpoints".bold(), checkpoints.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut current_session: Option<&str> = None;
    for cp in &checkpoints {
        if current_session != Some(cp.session_id.as_str()) {
            println!("{} {}", "session".dimmed(), cp.session_id.cyan());
            current_session = Some(cp.session_id.as_str());
        }
        println!("  {}", util::display_checkpoint_compact(cp));
    }

    Ok(())
}
