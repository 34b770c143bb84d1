//! Reconcile the checkpoint index with snapshot directories

use crate::util::{self, Env};
use anyhow::Result;
use bp_journal::reconcile::dir_size;
use owo_colors::OwoColorize;

pub async fn run(env: Env, sweep: bool) -> Result<()> {
    // 1. Scan
    let (orphans, missing, damaged) = {
        let env = env.clone();
        util::blocking(move || {
            let manager = env.manager()?;
            let store = manager.store();
            let orphans: Vec<_> = store
                .find_orphans()?
                .into_iter()
                .map(|dir| {
                    let size = dir_size(&dir);
                    (dir, size)
                })
                .collect();
            let damaged = store.is_degraded() || store.corrupt_index_path().exists();
            Ok((orphans, store.missing_snapshots(), damaged))
        })
        .await?
    };

    println!("{}", "Checkpoint Store Check".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    if damaged {
        println!(
            "{} index is damaged; entries may be missing, so orphans below can be live snapshots",
            "Warning:".yellow().bold()
        );
        println!();
    }

    if !missing.is_empty() {
        println!(
            "{} checkpoints have no snapshot (cannot be restored or forked):",
            missing.len().to_string().yellow()
        );
        for cp in &missing {
            println!("  {}", util::display_checkpoint_compact(cp));
        }
        println!();
    }

    if orphans.is_empty() {
        println!("{}", "No orphaned snapshots - store is clean".dimmed());
        return Ok(());
    }

    let total: u64 = orphans.iter().map(|(_, size)| size).sum();
    println!(
        "{} orphaned snapshot directories ({}):",
        orphans.len().to_string().yellow(),
        util::format_size(total)
    );
    for (dir, size) in &orphans {
        println!("  {} {}", dir.display(), util::format_size(*size).dimmed());
    }
    println!();

    // 2. Sweep only when asked
    if !sweep {
        println!("{}", "Run with --sweep to remove them".dimmed());
        return Ok(());
    }

    let report = util::blocking(move || {
        let manager = env.manager()?;
        Ok(manager.store().sweep_orphans()?)
    })
    .await?;

    println!("{}", "GC Complete".green().bold());
    println!("Directories removed: {}", report.removed.len().to_string().yellow());
    println!("Space freed:         {}", util::format_size(report.bytes_freed).green());

    Ok(())
}
