use bp_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by checkpoint store operations
///
/// A checkpoint that does not exist is not an error: lookups return `None`
/// and destructive operations return `false`.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode checkpoint index {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parent checkpoint not found: {0}")]
    ParentNotFound(String),

    #[error("Ambiguous checkpoint prefix '{prefix}': matches {count} checkpoints")]
    AmbiguousPrefix { prefix: String, count: usize },

    #[error("Session log already exists: {path}")]
    SessionExists { path: PathBuf },

    #[error("Invalid identifier: '{0}'")]
    InvalidId(String),

    #[error("Checkpoint index {path} is damaged or has a pending corrupt copy; repair it before sweeping orphans")]
    IndexDegraded { path: PathBuf },
}

impl JournalError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
