//! Core primitives for Branchpoint
//!
//! This crate provides:
//! - Structured session log records with explicit field defaulting
//! - A tolerant line-by-line session log reader
//! - Atomic write/copy helpers used for snapshots, restores and the index
//! - Session discovery under a projects directory

pub mod error;
pub mod fsutil;
pub mod reader;
pub mod record;
pub mod session;

pub use error::CoreError;
pub use fsutil::{atomic_copy, atomic_write, backup_path_for};
pub use reader::{last_message_uuid, read_all, read_until, write_records};
pub use record::{ChatMessage, Content, LogRecord, RecordKind};
pub use session::{decode_project_name, SessionLocator, SessionRef};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
