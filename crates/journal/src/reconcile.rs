//! Index ↔ snapshot directory reconciliation
//!
//! A snapshot directory without an index entry is left behind when the
//! process dies between removing a checkpoint's directory and saving the
//! index, or when the index is edited by hand. Nothing reaps these
//! implicitly: they are reported, and removed only on request.

use crate::checkpoint::Checkpoint;
use crate::error::JournalError;
use crate::store::{is_valid_id, CheckpointStore, SNAPSHOT_FILE};
use crate::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of [`CheckpointStore::sweep_orphans`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Orphan directories that were removed
    pub removed: Vec<PathBuf>,
    pub bytes_freed: u64,
}

impl CheckpointStore {
    /// Snapshot directories with no index entry
    ///
    /// Only directories named like a checkpoint that hold a snapshot file
    /// count; anything else under the store root is left alone.
    pub fn find_orphans(&self) -> Result<Vec<PathBuf>> {
        let live: HashSet<String> = self
            .refresh()
            .iter()
            .map(|c| c.checkpoint_id.clone())
            .collect();

        let entries = std::fs::read_dir(self.root()).map_err(|e| JournalError::io(self.root(), e))?;
        let mut orphans = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| JournalError::io(self.root(), e))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_valid_id(&name) || live.contains(&name) {
                continue;
            }
            let dir = entry.path();
            if holds_snapshot(&dir) {
                orphans.push(dir);
            }
        }

        orphans.sort();
        Ok(orphans)
    }

    /// Index entries whose snapshot file is absent
    ///
    /// Checkpoints created from a session log that did not exist legitimately
    /// have no snapshot; they can be listed but not restored or forked.
    pub fn missing_snapshots(&self) -> Vec<Checkpoint> {
        self.checkpoints()
            .iter()
            .filter(|c| !self.has_snapshot(&c.checkpoint_id))
            .cloned()
            .collect()
    }

    /// Remove every orphan snapshot directory
    ///
    /// Refuses while the index is damaged: entries lost to a corrupt index
    /// would make their live snapshots look orphaned.
    pub fn sweep_orphans(&self) -> Result<SweepReport> {
        let orphans = self.find_orphans()?;
        if self.is_degraded() || self.corrupt_index_path().exists() {
            warn!(
                "Not sweeping: checkpoint index {} is damaged",
                self.index_path().display()
            );
            return Err(JournalError::IndexDegraded {
                path: self.index_path().to_path_buf(),
            });
        }

        let mut report = SweepReport::default();
        for dir in orphans {
            let size = dir_size(&dir);
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {
                    report.bytes_freed += size;
                    report.removed.push(dir);
                }
                Err(e) => {
                    warn!("Failed to remove orphan {}: {}", dir.display(), e);
                    return Err(JournalError::io(dir, e));
                }
            }
        }

        info!(
            "Swept {} orphan snapshot directories ({} bytes)",
            report.removed.len(),
            report.bytes_freed
        );
        Ok(report)
    }
}

/// Total size of the regular files below `dir`
pub fn dir_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// True when `dir` looks like a checkpoint directory (contains a snapshot)
pub fn holds_snapshot(dir: &Path) -> bool {
    dir.join(SNAPSHOT_FILE).is_file()
}
