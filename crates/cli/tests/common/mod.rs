//! Common utilities for integration tests

pub mod cli;

use cli::BpCommand;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Encoded project directory every fixture session lives in
pub const PROJECT: &str = "-home-me-proj";

/// Isolated store, projects directory and config file for one test
pub struct TestProject {
    dir: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("projects").join(PROJECT)).expect("create project dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root().join("store")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root().join("projects")
    }

    pub fn project_dir(&self) -> PathBuf {
        self.projects_dir().join(PROJECT)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.project_dir().join(format!("{session_id}.jsonl"))
    }

    /// Write a session log with alternating user/assistant turns m0..mN
    pub fn write_session(&self, session_id: &str, turns: &[&str]) -> PathBuf {
        let mut log = String::new();
        for (i, text) in turns.iter().enumerate() {
            let role = if i % 2 == 0 { "user" } else { "assistant" };
            let record = serde_json::json!({
                "uuid": format!("m{i}"),
                "type": role,
                "sessionId": session_id,
                "message": {"role": role, "content": text},
            });
            log.push_str(&record.to_string());
            log.push('\n');
        }
        let path = self.session_path(session_id);
        fs::write(&path, log).expect("write session log");
        path
    }

    /// A `bp` command wired to this project's store, projects and config
    pub fn command(&self) -> BpCommand {
        let mut cmd = BpCommand::new(self.root());
        cmd.env(
            "BRANCHPOINT_CONFIG",
            self.config_path().to_str().expect("utf-8 temp path"),
        );
        cmd.args(&[
            "--store",
            self.store_dir().to_str().expect("utf-8 temp path"),
            "--projects",
            self.projects_dir().to_str().expect("utf-8 temp path"),
        ]);
        cmd
    }

    /// Parsed index.json
    pub fn index(&self) -> Vec<Value> {
        let raw = fs::read_to_string(self.store_dir().join("index.json")).unwrap_or_else(|_| "[]".into());
        serde_json::from_str(&raw).expect("index is a JSON array")
    }

    pub fn checkpoint(&self, id: &str) -> Option<Value> {
        self.index().into_iter().find(|c| c["checkpoint_id"] == id)
    }
}
