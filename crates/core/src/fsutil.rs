//! Crash-safe file replacement helpers

use crate::error::CoreError;
use crate::Result;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Suffix appended to a live session file when it is backed up before a restore
pub const BACKUP_SUFFIX: &str = ".backup";

/// Atomic write helper
///
/// Writes data to a temporary file next to the target, fsyncs it, then renames
/// it over the target. Readers observe either the old or the new content.
///
/// An existing target keeps its permissions.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = temp_sibling(target)?;
    tmp.write_all(data).map_err(|e| CoreError::io(target, e))?;
    if let Ok(meta) = std::fs::metadata(target) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| CoreError::io(target, e))?;
    }
    persist(tmp, target)
}

/// Atomically replace `target` with a copy of `source`
///
/// An existing target keeps its permissions; a new one takes the source's.
pub fn atomic_copy(source: &Path, target: &Path) -> Result<u64> {
    let mut input = File::open(source).map_err(|e| CoreError::io(source, e))?;
    let permissions = match std::fs::metadata(target) {
        Ok(meta) => meta.permissions(),
        Err(_) => input
            .metadata()
            .map_err(|e| CoreError::io(source, e))?
            .permissions(),
    };
    let mut tmp = temp_sibling(target)?;
    let copied = io::copy(&mut input, &mut tmp).map_err(|e| CoreError::io(target, e))?;
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| CoreError::io(target, e))?;
    persist(tmp, target)?;
    Ok(copied)
}

/// Backup location for a live session file (`abc.jsonl` -> `abc.jsonl.backup`)
pub fn backup_path_for(live: &Path) -> PathBuf {
    let mut name: OsString = live.file_name().map(OsString::from).unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    live.with_file_name(name)
}

fn temp_sibling(target: &Path) -> Result<NamedTempFile> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => {
            return Err(CoreError::NoParent {
                path: target.to_path_buf(),
            })
        }
    };

    std::fs::create_dir_all(&parent).map_err(|e| CoreError::io(&parent, e))?;
    NamedTempFile::new_in(&parent).map_err(|e| CoreError::io(&parent, e))
}

fn persist(tmp: NamedTempFile, target: &Path) -> Result<()> {
    tmp.as_file()
        .sync_all()
        .map_err(|e| CoreError::io(target, e))?;
    tmp.persist(target)
        .map_err(|e| CoreError::io(target, e.error))?;

    sync_parent(target);
    Ok(())
}

/// Fsync the parent directory so the rename itself is durable
#[cfg(unix)]
fn sync_parent(target: &Path) {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent(_target: &Path) {}
