//! Show a session's checkpoint tree

use crate::util::{self, Env};
use anyhow::{Context, Result};
use bp_journal::{Timeline, TimelineNode};
use owo_colors::OwoColorize;

pub async fn run(env: Env, session: String, json: bool, branch: Option<String>) -> Result<()> {
    let timeline = util::blocking(move || {
        let manager = env.manager()?;
        Ok(manager.timeline(&session))
    })
    .await?;

    if json {
        let out = serde_json::to_string_pretty(&timeline).context("Failed to encode timeline")?;
        println!("{}", out);
        return Ok(());
    }

    println!(
        "{} {} ({} checkpoints)",
        "Timeline".bold(),
        timeline.session_id.cyan(),
        timeline.total_checkpoints
    );
    if !timeline.branches.is_empty() {
        println!("{} {}", "Branches:".dimmed(), timeline.branches.join(", "));
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if timeline.is_empty() {
        println!("{}", "No checkpoints for this session".dimmed());
        return Ok(());
    }

    match branch {
        Some(name) => {
            for cp in timeline.on_branch(&name) {
                println!("{}", util::display_checkpoint_compact(cp));
            }
        }
        None => print!("{}", render_tree(&timeline)),
    }

    Ok(())
}

/// Box-drawing rendering of the forest, one checkpoint per line
fn render_tree(timeline: &Timeline) -> String {
    let mut out = String::new();
    let roots = &timeline.tree;
    for (i, node) in roots.iter().enumerate() {
        render_node(node, "", i + 1 == roots.len(), true, &mut out);
    }
    out
}

fn render_node(node: &TimelineNode, prefix: &str, last: bool, root: bool, out: &mut String) {
    let connector = match (root, last) {
        (true, _) => "",
        (false, true) => "└── ",
        (false, false) => "├── ",
    };
    out.push_str(prefix);
    out.push_str(connector);
    out.push_str(&util::display_checkpoint_compact(&node.checkpoint));
    out.push('\n');

    let child_prefix = match (root, last) {
        (true, _) => prefix.to_string(),
        (false, true) => format!("{}    ", prefix),
        (false, false) => format!("{}│   ", prefix),
    };
    for (i, child) in node.children.iter().enumerate() {
        render_node(child, &child_prefix, i + 1 == node.children.len(), false, out);
    }
}
