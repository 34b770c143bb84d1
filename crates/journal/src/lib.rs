//! Checkpoint journal and timeline management
//!
//! This crate provides:
//! - Checkpoint metadata (ULID-based IDs, parent links, branch labels)
//! - The checkpoint store: a JSON index plus one snapshot directory per checkpoint
//! - Create / delete / restore / fork operations
//! - Per-session timeline trees
//! - Unified diffs over the chat content of two checkpoints
//! - Orphan snapshot reconciliation

pub mod checkpoint;
pub mod diff;
pub mod error;
pub mod manager;
pub mod reconcile;
pub mod store;
pub mod timeline;

// Re-exports
pub use checkpoint::Checkpoint;
pub use diff::DiffOptions;
pub use error::JournalError;
pub use manager::{CheckpointManager, CreateRequest, DEFAULT_FORK_BRANCH};
pub use reconcile::SweepReport;
pub use store::{CheckpointStore, IndexCache};
pub use timeline::{Timeline, TimelineNode};

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;
