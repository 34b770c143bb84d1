//! Checkpoint operations: create, delete, restore, fork

use crate::checkpoint::Checkpoint;
use crate::diff::{self, DiffOptions};
use crate::error::JournalError;
use crate::store::{is_valid_id, CheckpointStore};
use crate::timeline::Timeline;
use crate::Result;
use bp_core::{atomic_copy, backup_path_for, read_until, write_records, LogRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Branch label given to forks when the caller does not choose one
pub const DEFAULT_FORK_BRANCH: &str = "fork";

/// Parameters for [`CheckpointManager::create`]
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub session_id: String,
    pub session_path: PathBuf,
    pub message_uuid: String,
    pub name: String,
    pub description: String,
    pub parent_checkpoint_id: Option<String>,
    pub branch_name: Option<String>,
}

impl CreateRequest {
    pub fn new(
        session_id: impl Into<String>,
        session_path: impl Into<PathBuf>,
        message_uuid: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            session_path: session_path.into(),
            message_uuid: message_uuid.into(),
            name: name.into(),
            description: String::new(),
            parent_checkpoint_id: None,
            branch_name: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn parent(mut self, parent_checkpoint_id: Option<String>) -> Self {
        self.parent_checkpoint_id = parent_checkpoint_id;
        self
    }

    pub fn branch(mut self, branch_name: Option<String>) -> Self {
        self.branch_name = branch_name;
        self
    }
}

/// Checkpoint operations over a [`CheckpointStore`]
///
/// Every operation is synchronous and blocking. Mutations re-read the index
/// before modifying it and write it back in a single save.
#[derive(Debug)]
pub struct CheckpointManager {
    store: CheckpointStore,
}

impl CheckpointManager {
    pub fn new(store: CheckpointStore) -> Self {
        Self { store }
    }

    /// Open the store at `root` and wrap it
    pub fn open(root: &Path) -> Result<Self> {
        Ok(Self::new(CheckpointStore::open(root)?))
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Snapshot the session log up to `message_uuid` and record a checkpoint
    ///
    /// When the session log does not exist the checkpoint is still recorded,
    /// without a snapshot.
    pub fn create(&self, request: CreateRequest) -> Result<Checkpoint> {
        let mut checkpoints = self.store.refresh().as_ref().clone();

        if let Some(parent) = &request.parent_checkpoint_id {
            if !checkpoints.iter().any(|c| &c.checkpoint_id == parent) {
                return Err(JournalError::ParentNotFound(parent.clone()));
            }
        }

        let mut checkpoint = Checkpoint::new(request.session_id, request.name, request.message_uuid);
        while checkpoints
            .iter()
            .any(|c| c.checkpoint_id == checkpoint.checkpoint_id)
        {
            checkpoint.checkpoint_id = ulid::Ulid::new().to_string();
        }
        checkpoint.description = request.description;
        checkpoint.parent_checkpoint_id = request.parent_checkpoint_id;
        checkpoint.branch_name = request.branch_name.filter(|b| !b.trim().is_empty());

        if request.session_path.exists() {
            let records = read_until(&request.session_path, &checkpoint.message_uuid)?;
            let snapshot = self.store.snapshot_path(&checkpoint.checkpoint_id)?;
            write_records(&snapshot, &records)?;
            debug!(
                "Wrote snapshot of {} records to {}",
                records.len(),
                snapshot.display()
            );
        } else {
            warn!(
                "Session log {} does not exist; checkpoint has no snapshot",
                request.session_path.display()
            );
        }

        checkpoints.push(checkpoint.clone());
        self.store.save(&checkpoints)?;

        info!(
            "Created checkpoint {} ({}) for session {}",
            checkpoint.checkpoint_id, checkpoint.name, checkpoint.session_id
        );
        Ok(checkpoint)
    }

    /// Delete a checkpoint and its snapshot
    ///
    /// Children are re-parented to the deleted checkpoint's parent. Returns
    /// `false` when the checkpoint does not exist.
    pub fn delete(&self, checkpoint_id: &str) -> Result<bool> {
        let mut checkpoints = self.store.refresh().as_ref().clone();

        let Some(pos) = checkpoints
            .iter()
            .position(|c| c.checkpoint_id == checkpoint_id)
        else {
            return Ok(false);
        };
        let removed = checkpoints.remove(pos);

        if is_valid_id(checkpoint_id) {
            let dir = self.store.snapshot_dir(checkpoint_id)?;
            if dir.exists() {
                std::fs::remove_dir_all(&dir).map_err(|e| JournalError::io(&dir, e))?;
            }
        } else {
            warn!("Not removing snapshot for invalid checkpoint id '{}'", checkpoint_id);
        }

        let mut reparented = 0usize;
        for cp in checkpoints.iter_mut() {
            if cp.parent_checkpoint_id.as_deref() == Some(checkpoint_id) {
                cp.parent_checkpoint_id = removed.parent_checkpoint_id.clone();
                reparented += 1;
            }
        }

        self.store.save(&checkpoints)?;

        info!(
            "Deleted checkpoint {} (re-parented {} children)",
            checkpoint_id, reparented
        );
        Ok(true)
    }

    /// Replace a live session log with a checkpoint's snapshot
    ///
    /// An existing live log is first copied to `<live>.backup`; the live log is
    /// only touched once that copy succeeded. Returns `false` when the
    /// checkpoint or its snapshot is missing.
    pub fn restore(&self, checkpoint_id: &str, live_session_path: &Path) -> Result<bool> {
        let Some(checkpoint) = self.store.find(checkpoint_id) else {
            return Ok(false);
        };
        if !self.store.has_snapshot(&checkpoint.checkpoint_id) {
            return Ok(false);
        }
        let snapshot = self.store.snapshot_path(&checkpoint.checkpoint_id)?;

        if live_session_path.exists() {
            let backup = backup_path_for(live_session_path);
            atomic_copy(live_session_path, &backup)?;
            debug!("Backed up live session to {}", backup.display());
        }

        atomic_copy(&snapshot, live_session_path)?;

        info!(
            "Restored {} to checkpoint {}",
            live_session_path.display(),
            checkpoint.checkpoint_id
        );
        Ok(true)
    }

    /// Start a new session from a checkpoint's snapshot
    ///
    /// Writes `<target_directory>/<new_session_id>.jsonl` with every record
    /// re-tagged to the new session, then records a checkpoint in the new
    /// session whose parent is the source checkpoint. Returns `None` when the
    /// checkpoint or its snapshot is missing.
    pub fn fork(
        &self,
        checkpoint_id: &str,
        new_session_id: &str,
        target_directory: &Path,
        branch_name: &str,
    ) -> Result<Option<PathBuf>> {
        let Some(source) = self.store.find(checkpoint_id) else {
            return Ok(None);
        };
        let Some(mut records) = self.store.read_snapshot(&source.checkpoint_id)? else {
            return Ok(None);
        };

        if !is_valid_id(new_session_id) {
            return Err(JournalError::InvalidId(new_session_id.to_string()));
        }
        let new_session_path = target_directory.join(format!("{new_session_id}.jsonl"));
        if new_session_path.exists() {
            return Err(JournalError::SessionExists {
                path: new_session_path,
            });
        }

        for record in records.iter_mut() {
            record.set_session_id(new_session_id);
        }
        write_records(&new_session_path, &records)?;

        let request = CreateRequest::new(
            new_session_id,
            &new_session_path,
            source.message_uuid.clone(),
            format!("Fork from {}", source.name),
        )
        .description(format!("Forked from checkpoint: {}", source.name))
        .parent(Some(source.checkpoint_id.clone()))
        .branch(Some(branch_name.to_string()));
        if let Err(e) = self.create(request) {
            // Leave no session behind without its fork checkpoint
            if let Err(rm) = std::fs::remove_file(&new_session_path) {
                warn!(
                    "Failed to remove unrecorded fork {}: {}",
                    new_session_path.display(),
                    rm
                );
            }
            return Err(e);
        }

        info!(
            "Forked checkpoint {} into session {}",
            source.checkpoint_id, new_session_id
        );
        Ok(Some(new_session_path))
    }

    /// User and assistant records of a checkpoint's snapshot
    pub fn messages(&self, checkpoint_id: &str) -> Result<Vec<LogRecord>> {
        let records = self.store.read_snapshot(checkpoint_id)?.unwrap_or_default();
        Ok(records.into_iter().filter(|r| r.kind().is_chat()).collect())
    }

    /// Checkpoint tree of one session
    pub fn timeline(&self, session_id: &str) -> Timeline {
        Timeline::build(session_id, &self.store.checkpoints())
    }

    /// Unified diff of the chat content of two checkpoints
    ///
    /// A checkpoint without a snapshot contributes no lines.
    pub fn diff(&self, checkpoint_a: &str, checkpoint_b: &str, options: &DiffOptions) -> Result<Vec<String>> {
        let old = self.store.read_snapshot(checkpoint_a)?.unwrap_or_default();
        let new = self.store.read_snapshot(checkpoint_b)?.unwrap_or_default();

        Ok(diff::diff_records(
            &old,
            &new,
            &diff::checkpoint_label(checkpoint_a),
            &diff::checkpoint_label(checkpoint_b),
            options,
        ))
    }
}
