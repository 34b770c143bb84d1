//! Session discovery
//!
//! Session logs live at `<projects>/<encoded project>/<session id>.jsonl`,
//! where the project directory name is the project path with separators
//! replaced by `-`.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of session log files
pub const SESSION_EXTENSION: &str = "jsonl";

/// A session log found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub session_id: String,
    pub path: PathBuf,
    /// Decoded project path (e.g. `/home/me/proj`)
    pub project: String,
}

/// Locates session logs under a projects directory
#[derive(Debug, Clone)]
pub struct SessionLocator {
    projects_dir: PathBuf,
}

impl SessionLocator {
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// All session logs, one directory level below the projects directory
    pub fn list(&self) -> Vec<SessionRef> {
        let mut sessions: Vec<SessionRef> = WalkDir::new(&self.projects_dir)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| to_session_ref(e.path()))
            .collect();

        sessions.sort_by(|a, b| a.path.cmp(&b.path));
        sessions
    }

    /// Find the log of a session by id
    pub fn find(&self, session_id: &str) -> Option<SessionRef> {
        self.list().into_iter().find(|s| s.session_id == session_id)
    }

    /// Resolve a session reference given either as an id or as a path to a log
    pub fn resolve(&self, reference: &str) -> Option<SessionRef> {
        let as_path = Path::new(reference);
        if as_path.is_file() {
            return to_session_ref(as_path);
        }
        self.find(reference)
    }
}

fn to_session_ref(path: &Path) -> Option<SessionRef> {
    if path.extension().and_then(|e| e.to_str()) != Some(SESSION_EXTENSION) {
        return None;
    }
    let session_id = path.file_stem()?.to_str()?.to_string();
    let project = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(decode_project_name)
        .unwrap_or_default();

    Some(SessionRef {
        session_id,
        path: path.to_path_buf(),
        project,
    })
}

/// Convert an encoded project directory name back to a readable path
///
/// - `-home-me-proj` -> `/home/me/proj`
/// - `D--repos-x` -> `D:/repos/x`
///
/// The encoding is lossy: hyphens inside real directory names decode as
/// separators.
pub fn decode_project_name(dir_name: &str) -> String {
    if let Some(rest) = dir_name.strip_prefix('-') {
        return format!("/{}", rest.replace('-', "/"));
    }

    let bytes = dir_name.as_bytes();
    if bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b"--" {
        return format!("{}:/{}", &dir_name[..1], dir_name[3..].replace('-', "/"));
    }

    dir_name.replace('-', "/")
}
