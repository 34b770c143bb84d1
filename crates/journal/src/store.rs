//! Checkpoint index and snapshot storage
//!
//! Manages the store directory:
//! ```text
//! <store>/
//!   index.json            # JSON array of checkpoint metadata
//!   <checkpoint_id>/
//!     session.jsonl       # snapshot: session log truncated at message_uuid
//! ```
//!
//! The index is the single source of truth for which checkpoints exist. It is
//! rewritten in full on every save and is not locked: one writer per store.

use crate::checkpoint::Checkpoint;
use crate::error::JournalError;
use crate::Result;
use bp_core::{atomic_copy, atomic_write, read_all, LogRecord};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Index file name inside the store directory
pub const INDEX_FILE: &str = "index.json";
/// Snapshot file name inside a checkpoint directory
pub const SNAPSHOT_FILE: &str = "session.jsonl";
/// Copy of an index that failed to parse, kept for manual recovery
pub const CORRUPT_INDEX_FILE: &str = "index.json.corrupt";

/// Minimum prefix length accepted by [`CheckpointStore::resolve`]
pub const MIN_PREFIX_LEN: usize = 4;

/// In-memory copy of the parsed index
///
/// Owned by the store. Callers that need to observe a change made outside
/// this process call [`CheckpointStore::refresh`] or
/// [`CheckpointStore::invalidate`].
#[derive(Debug, Default)]
pub struct IndexCache {
    entries: RwLock<Option<Arc<Vec<Checkpoint>>>>,
}

impl IndexCache {
    pub fn get(&self) -> Option<Arc<Vec<Checkpoint>>> {
        self.entries.read().clone()
    }

    pub fn set(&self, checkpoints: Vec<Checkpoint>) -> Arc<Vec<Checkpoint>> {
        let shared = Arc::new(checkpoints);
        *self.entries.write() = Some(Arc::clone(&shared));
        shared
    }

    pub fn invalidate(&self) {
        *self.entries.write() = None;
    }

    pub fn is_warm(&self) -> bool {
        self.entries.read().is_some()
    }
}

/// Durable checkpoint index plus per-checkpoint snapshot directories
#[derive(Debug)]
pub struct CheckpointStore {
    root: PathBuf,
    index_path: PathBuf,
    cache: IndexCache,
    /// Set when the last load dropped data (unreadable index or entries)
    degraded: AtomicBool,
}

impl CheckpointStore {
    /// Open (or create) a store rooted at `root`
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| JournalError::io(root, e))?;
        Ok(Self {
            root: root.to_path_buf(),
            index_path: root.join(INDEX_FILE),
            cache: IndexCache::default(),
            degraded: AtomicBool::new(false),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn corrupt_index_path(&self) -> PathBuf {
        self.root.join(CORRUPT_INDEX_FILE)
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// True when the last load could not read every index entry
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Read the index from disk and repopulate the cache
    ///
    /// Never fails: a missing index is initialized to `[]`, an unreadable or
    /// unparseable one is treated as empty. Entries that do not decode are
    /// skipped individually.
    pub fn load(&self) -> Arc<Vec<Checkpoint>> {
        let raw = match std::fs::read(&self.index_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Initializing empty index at {}", self.index_path.display());
                self.degraded.store(false, Ordering::Release);
                if let Err(e) = self.save(&[]) {
                    warn!("Failed to initialize checkpoint index: {}", e);
                }
                return self.cache.set(Vec::new());
            }
            Err(e) => {
                warn!(
                    "Failed to read checkpoint index {}: {}",
                    self.index_path.display(),
                    e
                );
                self.degraded.store(true, Ordering::Release);
                return self.cache.set(Vec::new());
            }
        };

        let entries = match serde_json::from_slice::<Vec<Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Checkpoint index {} is corrupt, treating as empty: {}",
                    self.index_path.display(),
                    e
                );
                self.preserve_corrupt_index();
                self.degraded.store(true, Ordering::Release);
                return self.cache.set(Vec::new());
            }
        };

        let mut checkpoints = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for (pos, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Checkpoint>(entry) {
                Ok(cp) => checkpoints.push(cp),
                Err(e) => {
                    warn!("Skipping unreadable index entry {}: {}", pos, e);
                    skipped += 1;
                }
            }
        }
        self.degraded.store(skipped > 0, Ordering::Release);

        debug!("Loaded {} checkpoints from index", checkpoints.len());
        self.cache.set(checkpoints)
    }

    /// Atomically replace the whole index with `checkpoints`
    pub fn save(&self, checkpoints: &[Checkpoint]) -> Result<()> {
        let data = serde_json::to_vec_pretty(checkpoints).map_err(|source| JournalError::Encode {
            path: self.index_path.clone(),
            source,
        })?;
        atomic_write(&self.index_path, &data)?;
        self.cache.set(checkpoints.to_vec());
        Ok(())
    }

    /// All checkpoints, served from the cache when it is warm
    pub fn checkpoints(&self) -> Arc<Vec<Checkpoint>> {
        match self.cache.get() {
            Some(cached) => cached,
            None => self.load(),
        }
    }

    /// Force a re-read of the index, bypassing the cache
    pub fn refresh(&self) -> Arc<Vec<Checkpoint>> {
        self.load()
    }

    /// Drop the cached index; the next read goes to disk
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// All checkpoints, optionally filtered to one session, in index order
    pub fn get(&self, session_id: Option<&str>) -> Vec<Checkpoint> {
        let all = self.checkpoints();
        match session_id {
            Some(sid) => all.iter().filter(|c| c.session_id == sid).cloned().collect(),
            None => all.as_ref().clone(),
        }
    }

    /// Look up a checkpoint by exact ID
    pub fn find(&self, checkpoint_id: &str) -> Option<Checkpoint> {
        self.checkpoints()
            .iter()
            .find(|c| c.checkpoint_id == checkpoint_id)
            .cloned()
    }

    /// Resolve a checkpoint reference
    ///
    /// Supports:
    /// - Full ID: "01HN8XYZ..."
    /// - Unique ID prefix of at least 4 characters: "01HN8"
    pub fn resolve(&self, reference: &str) -> Result<Option<Checkpoint>> {
        if let Some(cp) = self.find(reference) {
            return Ok(Some(cp));
        }
        if reference.chars().count() < MIN_PREFIX_LEN {
            return Ok(None);
        }

        let all = self.checkpoints();
        let matching: Vec<_> = all
            .iter()
            .filter(|c| c.checkpoint_id.starts_with(reference))
            .collect();

        match matching.len() {
            0 => Ok(None),
            1 => Ok(Some(matching[0].clone())),
            count => Err(JournalError::AmbiguousPrefix {
                prefix: reference.to_string(),
                count,
            }),
        }
    }

    /// Directory holding a checkpoint's snapshot
    pub fn snapshot_dir(&self, checkpoint_id: &str) -> Result<PathBuf> {
        if !is_valid_id(checkpoint_id) {
            return Err(JournalError::InvalidId(checkpoint_id.to_string()));
        }
        Ok(self.root.join(checkpoint_id))
    }

    /// Snapshot file of a checkpoint
    pub fn snapshot_path(&self, checkpoint_id: &str) -> Result<PathBuf> {
        Ok(self.snapshot_dir(checkpoint_id)?.join(SNAPSHOT_FILE))
    }

    pub fn has_snapshot(&self, checkpoint_id: &str) -> bool {
        self.snapshot_path(checkpoint_id)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Records of a checkpoint's snapshot, `None` when there is no snapshot
    pub fn read_snapshot(&self, checkpoint_id: &str) -> Result<Option<Vec<LogRecord>>> {
        if !self.has_snapshot(checkpoint_id) {
            return Ok(None);
        }
        let records = read_all(&self.snapshot_path(checkpoint_id)?)?;
        Ok(Some(records))
    }

    fn preserve_corrupt_index(&self) {
        let target = self.corrupt_index_path();
        if let Err(e) = atomic_copy(&self.index_path, &target) {
            warn!("Failed to preserve corrupt index: {}", e);
        }
    }
}

/// Checkpoint and session IDs become path components; reject anything that
/// could escape the directory it is joined onto
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.contains('\0')
}
