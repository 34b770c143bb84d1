//! Shared utilities for CLI commands

use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use bp_core::{SessionLocator, SessionRef};
use bp_journal::{Checkpoint, CheckpointManager};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Resolved locations and settings for one invocation
#[derive(Debug, Clone)]
pub struct Env {
    pub config: SystemConfig,
    pub store_dir: PathBuf,
    pub projects_dir: PathBuf,
}

impl Env {
    /// Apply command-line overrides on top of the loaded config
    pub fn new(config: SystemConfig, store: Option<PathBuf>, projects: Option<PathBuf>) -> Self {
        let store_dir = store.unwrap_or_else(|| config.store_dir());
        let projects_dir = projects.unwrap_or_else(|| config.projects_dir());
        Self {
            config,
            store_dir,
            projects_dir,
        }
    }

    pub fn manager(&self) -> Result<CheckpointManager> {
        CheckpointManager::open(&self.store_dir).with_context(|| {
            format!("Failed to open checkpoint store at {}", self.store_dir.display())
        })
    }

    pub fn locator(&self) -> SessionLocator {
        SessionLocator::new(&self.projects_dir)
    }

    /// Find a session log by id or path
    pub fn session(&self, reference: &str) -> Result<SessionRef> {
        self.locator().resolve(reference).with_context(|| {
            format!(
                "Session '{}' not found under {}",
                reference,
                self.projects_dir.display()
            )
        })
    }
}

/// Run blocking store work off the async runtime
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("Background task failed")?
}

/// Resolve a checkpoint reference (full ID or unique prefix)
pub fn resolve_checkpoint_ref(manager: &CheckpointManager, reference: &str) -> Result<Checkpoint> {
    manager
        .store()
        .resolve(reference)?
        .with_context(|| format!("Unknown checkpoint reference: '{}'", reference))
}

/// Steady-ticking spinner on stderr; hidden when stderr is not a terminal
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Ask a yes/no question on stdin; anything but "y"/"yes" is a no
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} {} ", prompt, "[y/N]".dimmed());
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Format timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let seconds = (Utc::now() - ts).num_seconds();
    if seconds < 0 {
        return "in the future".to_string();
    }

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Format timestamp as absolute time ("2024-01-03 14:30:00")
pub fn format_absolute_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format file size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// One-line checkpoint summary: `01HN8XYZ  2 hours ago  name  [branch]`
pub fn display_checkpoint_compact(cp: &Checkpoint) -> String {
    let branch = match cp.branch_name.as_deref() {
        Some(b) => format!(" [{}]", b).cyan().to_string(),
        None => String::new(),
    };
    format!(
        "{}  {}  {}{}",
        cp.short_id().yellow(),
        format_relative_time(cp.timestamp).dimmed(),
        cp.name.bold(),
        branch
    )
}
