//! Branchpoint CLI - bp command

use anyhow::Result;
use bp_journal::DEFAULT_FORK_BRANCH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod diff_utils;
mod logging;
mod system_config;
mod util;

/// Branchpoint - Checkpoints and branching timelines for assistant session logs
#[derive(Parser)]
#[command(name = "bp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Checkpoint store directory (overrides store.directory)
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Directory holding per-project session logs (overrides sessions.projects_directory)
    #[arg(long, global = true, value_name = "DIR")]
    projects: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a checkpoint of a session
    Create {
        /// Session ID or path to a session log
        session: String,
        /// Checkpoint name
        name: String,
        /// Message UUID to checkpoint at (default: last user/assistant message)
        #[arg(short, long)]
        message: Option<String>,
        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Parent checkpoint ID or prefix
        #[arg(short, long)]
        parent: Option<String>,
        /// Branch label
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// List checkpoints
    List {
        /// Only checkpoints of this session
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Show checkpoint details and its last messages
    Show {
        /// Checkpoint ID or prefix
        checkpoint: String,
        /// Number of trailing messages to preview
        #[arg(short = 'n', long, default_value = "10")]
        messages: usize,
    },
    /// Delete a checkpoint, re-parenting its children
    Delete {
        /// Checkpoint ID or prefix
        checkpoint: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Replace a live session log with a checkpoint's snapshot
    Restore {
        /// Checkpoint ID or prefix
        checkpoint: String,
        /// Session log to overwrite (default: the checkpoint's own session log)
        #[arg(long, value_name = "PATH")]
        to: Option<PathBuf>,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Start a new session from a checkpoint
    Fork {
        /// Checkpoint ID or prefix
        checkpoint: String,
        /// ID of the new session (default: random UUID)
        #[arg(long)]
        session: Option<String>,
        /// Directory for the new session log (default: the source session's project)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Branch label of the fork checkpoint
        #[arg(short, long, default_value = DEFAULT_FORK_BRANCH)]
        branch: String,
    },
    /// Show the checkpoint tree of a session
    Timeline {
        /// Session ID
        session: String,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
        /// Only show checkpoints on this branch (plus unlabeled ones)
        #[arg(long)]
        branch: Option<String>,
    },
    /// Show diff between the conversations of two checkpoints
    Diff {
        /// First checkpoint ID or prefix
        checkpoint_a: String,
        /// Second checkpoint ID or prefix
        checkpoint_b: String,
        /// Number of context lines (default: diff.context_lines)
        #[arg(short = 'U', long)]
        context: Option<usize>,
        /// Characters of each message to compare (default: diff.preview_chars)
        #[arg(long)]
        preview: Option<usize>,
    },
    /// Find snapshot directories without an index entry
    Gc {
        /// Remove orphaned snapshot directories (default: report only)
        #[arg(long)]
        sweep: bool,
    },
    /// View or edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a configuration value
    Get {
        /// Dotted key, e.g. diff.context_lines
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Dotted key, e.g. diff.context_lines
        key: String,
        /// New value
        value: String,
    },
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = system_config::load()?;
    let _log_guard = logging::init(&config.log, config.log_dir().as_deref())?;
    let env = util::Env::new(config, cli.store, cli.projects);
    tracing::debug!(
        "Using store {} and projects {}",
        env.store_dir.display(),
        env.projects_dir.display()
    );

    match cli.command {
        Commands::Create { session, name, message, description, parent, branch } => {
            cmd::create::run(env, session, name, message, description, parent, branch).await
        }
        Commands::List { session } => cmd::list::run(env, session).await,
        Commands::Show { checkpoint, messages } => cmd::show::run(env, checkpoint, messages).await,
        Commands::Delete { checkpoint, yes } => cmd::delete::run(env, checkpoint, yes).await,
        Commands::Restore { checkpoint, to, yes } => cmd::restore::run(env, checkpoint, to, yes).await,
        Commands::Fork { checkpoint, session, dir, branch } => {
            cmd::fork::run(env, checkpoint, session, dir, branch).await
        }
        Commands::Timeline { session, json, branch } => {
            cmd::timeline::run(env, session, json, branch).await
        }
        Commands::Diff { checkpoint_a, checkpoint_b, context, preview } => {
            cmd::diff::run(env, checkpoint_a, checkpoint_b, context, preview).await
        }
        Commands::Gc { sweep } => cmd::gc::run(env, sweep).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
