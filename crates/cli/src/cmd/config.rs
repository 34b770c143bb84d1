//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use crate::system_config::{self, KEYS};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    let mut section = "";
    for &key in KEYS {
        let (group, name) = key.split_once('.').unwrap_or(("", key));
        if group != section {
            if !section.is_empty() {
                println!();
            }
            println!("{}", format!("[{}]", group).yellow());
            section = group;
        }
        let value = config.get(key).unwrap_or_default();
        println!("  {} = {}", name.cyan(), value);
    }

    println!("\n{}", "Resolved paths:".bold());
    println!("  store:    {}", config.store_dir().display());
    println!("  projects: {}", config.projects_dir().display());

    println!("\n{}", "Valid Ranges:".bold());
    println!("  diff.preview_chars: 1-10000");
    println!("  diff.context_lines: 0-100");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;

    let value = config.get(key).with_context(|| {
        format!("Unknown config key: {}. Use 'bp config list' to see available keys.", key)
    })?;

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;
    config.set(key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    let example = system_config::example_config();
    println!("{}", example);
    Ok(())
}
