//! System-wide configuration
//!
//! Stored as TOML at `<config dir>/branchpoint/config.toml`, or wherever
//! `BRANCHPOINT_CONFIG` points. Missing files and missing keys fall back to
//! defaults.

use anyhow::{Context, Result};
use bp_journal::DiffOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "BRANCHPOINT_CONFIG";

const CONFIG_DIR: &str = "branchpoint";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("diff.preview_chars must be between 1 and 10000 (got {0})")]
    PreviewChars(usize),

    #[error("diff.context_lines must be between 0 and 100 (got {0})")]
    ContextLines(usize),

    #[error("{key} must not be empty")]
    EmptyPath { key: &'static str },

    #[error("log.level '{0}' is not a valid filter")]
    LogLevel(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub store: StoreConfig,
    pub sessions: SessionsConfig,
    pub diff: DiffConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Checkpoint store directory; `~` expands to the home directory
    pub directory: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: "~/.claude/branchpoint/checkpoints".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Directory holding one sub-directory of session logs per project
    pub projects_directory: String,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            projects_directory: "~/.claude/projects".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub preview_chars: usize,
    pub context_lines: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        let defaults = DiffOptions::default();
        Self {
            preview_chars: defaults.preview_chars,
            context_lines: defaults.context_lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Directory for a daily log file; empty disables file logging
    pub directory: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            directory: String::new(),
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(1..=10_000).contains(&self.diff.preview_chars) {
            return Err(ConfigError::PreviewChars(self.diff.preview_chars));
        }
        if self.diff.context_lines > 100 {
            return Err(ConfigError::ContextLines(self.diff.context_lines));
        }
        if self.store.directory.trim().is_empty() {
            return Err(ConfigError::EmptyPath { key: "store.directory" });
        }
        if self.sessions.projects_directory.trim().is_empty() {
            return Err(ConfigError::EmptyPath {
                key: "sessions.projects_directory",
            });
        }
        if tracing_subscriber::EnvFilter::try_new(&self.log.level).is_err() {
            return Err(ConfigError::LogLevel(self.log.level.clone()));
        }
        Ok(())
    }

    pub fn store_dir(&self) -> PathBuf {
        expand_home(&self.store.directory)
    }

    pub fn projects_dir(&self) -> PathBuf {
        expand_home(&self.sessions.projects_directory)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        let dir = self.log.directory.trim();
        (!dir.is_empty()).then(|| expand_home(dir))
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            preview_chars: self.diff.preview_chars,
            context_lines: self.diff.context_lines,
        }
    }

    /// Read a value by dotted key (`diff.context_lines`)
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "store.directory" => self.store.directory.clone(),
            "sessions.projects_directory" => self.sessions.projects_directory.clone(),
            "diff.preview_chars" => self.diff.preview_chars.to_string(),
            "diff.context_lines" => self.diff.context_lines.to_string(),
            "log.level" => self.log.level.clone(),
            "log.directory" => self.log.directory.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a value by dotted key. Does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "store.directory" => self.store.directory = value.to_string(),
            "sessions.projects_directory" => self.sessions.projects_directory = value.to_string(),
            "diff.preview_chars" => {
                self.diff.preview_chars = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            "diff.context_lines" => {
                self.diff.context_lines = value
                    .parse()
                    .context("Invalid value: must be a non-negative integer")?;
            }
            "log.level" => self.log.level = value.to_string(),
            "log.directory" => self.log.directory = value.to_string(),
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'bp config list' to see available keys.",
                key
            ),
        }
        Ok(())
    }
}

/// All keys understood by [`SystemConfig::get`] and [`SystemConfig::set`]
pub const KEYS: &[&str] = &[
    "store.directory",
    "sessions.projects_directory",
    "diff.preview_chars",
    "diff.context_lines",
    "log.level",
    "log.directory",
];

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the config, falling back to defaults when no file exists
pub fn load() -> Result<SystemConfig> {
    match config_file_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(SystemConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<SystemConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(config, &path)
}

pub fn save_to(config: &SystemConfig, path: &Path) -> Result<()> {
    let raw = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    bp_core::atomic_write(path, raw.as_bytes())
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Write the default config if no file exists yet
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save_to(&SystemConfig::default(), &path)?;
    }
    Ok(path)
}

pub fn example_config() -> String {
    r#"# Branchpoint configuration

[store]
# Where checkpoint snapshots and index.json live
directory = "~/.claude/branchpoint/checkpoints"

[sessions]
# One sub-directory per project, each holding <session-id>.jsonl logs
projects_directory = "~/.claude/projects"

[diff]
# Characters of each message shown in diffs (1-10000)
preview_chars = 200
# Unchanged lines around each change (0-100)
context_lines = 3

[log]
# Filter used when RUST_LOG is not set
level = "warn"
# Daily rotating log files go here; leave empty to log to stderr only
directory = ""
"#
    .to_string()
}

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(raw),
    }
}
