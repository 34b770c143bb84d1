//! End-to-end tests driving the `bp` binary

mod common;

use anyhow::Result;
use common::TestProject;
use serde_json::Value;
use std::fs;

const TURNS: &[&str] = &["hello", "hi, how can I help?", "refactor the parser"];

fn create(project: &TestProject, args: &[&str]) -> Result<String> {
    let mut cmd = project.command();
    cmd.args(&["create"]).args(args);
    let result = cmd.assert_success()?;
    result
        .parse_checkpoint_id()
        .ok_or_else(|| anyhow::anyhow!("no checkpoint id in output: {}", result.stdout))
}

#[test]
fn create_defaults_to_last_message() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);

    let id = create(&project, &["s1", "first"])?;

    let cp = project.checkpoint(&id).expect("checkpoint in index");
    assert_eq!(cp["session_id"], "s1");
    assert_eq!(cp["message_uuid"], "m2");
    assert_eq!(cp["parent_checkpoint_id"], Value::Null);
    assert!(project.store_dir().join(&id).join("session.jsonl").is_file());
    Ok(())
}

#[test]
fn create_accepts_session_path_and_parent_prefix() -> Result<()> {
    let project = TestProject::new();
    let log = project.write_session("s1", TURNS);
    let log = log.to_str().unwrap();

    let parent = create(&project, &[log, "base", "--message", "m0"])?;
    let child = create(&project, &[log, "child", "-m", "m1", "--parent", &parent[..10], "-b", "exp"])?;

    let cp = project.checkpoint(&child).unwrap();
    assert_eq!(cp["parent_checkpoint_id"], parent.as_str());
    assert_eq!(cp["branch_name"], "exp");
    Ok(())
}

#[test]
fn create_unknown_session_fails() -> Result<()> {
    let project = TestProject::new();
    let result = bp!(project, "create", "ghost", "x").assert_failure()?;
    assert!(result.contains_stderr("not found"));
    assert!(project.index().is_empty());
    Ok(())
}

#[test]
fn list_and_show() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    project.write_session("s2", &["other"]);
    let id = create(&project, &["s1", "first", "-d", "before refactor"])?;
    create(&project, &["s2", "second"])?;

    let all = bp!(project, "list").assert_success()?;
    assert!(all.contains_stdout("first"));
    assert!(all.contains_stdout("second"));

    let only_s1 = bp!(project, "list", "--session", "s1").assert_success()?;
    assert!(only_s1.contains_stdout("first"));
    assert!(!only_s1.contains_stdout("second"));

    let show = bp!(project, "show", &id, "-n", "2").assert_success()?;
    assert!(show.contains_stdout("before refactor"));
    assert!(show.contains_stdout("refactor the parser"));
    assert!(show.contains_stdout("1 earlier messages omitted"));
    Ok(())
}

#[test]
fn delete_reparents_children() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    let root = create(&project, &["s1", "root", "-m", "m0"])?;
    let middle = create(&project, &["s1", "middle", "-m", "m1", "-p", &root])?;
    let leaf = create(&project, &["s1", "leaf", "-p", &middle])?;

    bp!(project, "delete", &middle, "-y").assert_success()?;

    assert!(project.checkpoint(&middle).is_none());
    assert_eq!(project.checkpoint(&leaf).unwrap()["parent_checkpoint_id"], root.as_str());
    assert!(!project.store_dir().join(&middle).exists());
    Ok(())
}

#[test]
fn delete_prompt_can_be_declined() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    let id = create(&project, &["s1", "keep"])?;

    let result = bp!(project, "delete", &id).stdin("n\n").assert_success()?;
    assert!(result.contains_stdout("Aborted"));
    assert!(project.checkpoint(&id).is_some());

    bp!(project, "delete", &id).stdin("y\n").assert_success()?;
    assert!(project.checkpoint(&id).is_none());
    Ok(())
}

#[test]
fn restore_writes_backup() -> Result<()> {
    let project = TestProject::new();
    let log = project.write_session("s1", TURNS);
    let id = create(&project, &["s1", "early", "-m", "m0"])?;

    let before = fs::read(&log)?;
    bp!(project, "restore", &id, "-y").assert_success()?;

    assert_eq!(fs::read(log.with_file_name("s1.jsonl.backup"))?, before);
    assert_eq!(fs::read_to_string(&log)?.lines().count(), 1);
    Ok(())
}

#[test]
fn restore_to_explicit_target() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    let id = create(&project, &["s1", "all"])?;

    let target = project.root().join("elsewhere.jsonl");
    bp!(project, "restore", &id, "--to", target.to_str().unwrap(), "-y").assert_success()?;
    assert_eq!(fs::read_to_string(&target)?.lines().count(), 3);
    Ok(())
}

#[test]
fn fork_creates_tagged_session() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    let id = create(&project, &["s1", "base", "-m", "m1"])?;

    bp!(project, "fork", &id, "--session", "s2", "--branch", "experiment").assert_success()?;

    let forked = fs::read_to_string(project.session_path("s2"))?;
    let records: Vec<Value> = forked
        .lines()
        .map(serde_json::from_str)
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["sessionId"] == "s2"));

    let fork_cp = project
        .index()
        .into_iter()
        .find(|c| c["session_id"] == "s2")
        .expect("fork checkpoint recorded");
    assert_eq!(fork_cp["parent_checkpoint_id"], id.as_str());
    assert_eq!(fork_cp["branch_name"], "experiment");

    // Forking onto an existing session is refused
    let result = bp!(project, "fork", &id, "--session", "s2").assert_failure()?;
    assert!(result.contains_stderr("already exists"));
    Ok(())
}

#[test]
fn timeline_json_and_tree() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    let root = create(&project, &["s1", "root", "-m", "m0"])?;
    create(&project, &["s1", "a", "-m", "m1", "-p", &root, "-b", "alpha"])?;
    create(&project, &["s1", "b", "-m", "m2", "-p", &root, "-b", "beta"])?;

    let json = bp!(project, "timeline", "s1", "--json").assert_success()?;
    let timeline: Value = serde_json::from_str(&json.stdout)?;
    assert_eq!(timeline["total_checkpoints"], 3);
    assert_eq!(timeline["branches"], serde_json::json!(["alpha", "beta"]));
    assert_eq!(timeline["tree"].as_array().unwrap().len(), 1);
    assert_eq!(timeline["tree"][0]["children"].as_array().unwrap().len(), 2);

    let tree = bp!(project, "timeline", "s1").assert_success()?;
    assert!(tree.contains_stdout("├── "));
    assert!(tree.contains_stdout("└── "));

    let alpha = bp!(project, "timeline", "s1", "--branch", "alpha").assert_success()?;
    assert!(alpha.contains_stdout("root"));
    assert!(!alpha.contains_stdout("[beta]"));
    Ok(())
}

#[test]
fn diff_between_checkpoints() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    let a = create(&project, &["s1", "a", "-m", "m1"])?;
    let b = create(&project, &["s1", "b", "-m", "m2"])?;

    let same = bp!(project, "diff", &a, &a).assert_success()?;
    assert!(same.contains_stdout("No changes between checkpoints"));

    let diff = bp!(project, "diff", &a, &b).assert_success()?;
    assert!(diff.contains_stdout(&format!("--- Checkpoint {}", &a[..8])));
    assert!(diff.contains_stdout("+[user]: refactor the parser"));

    let truncated = bp!(project, "diff", &a, &b, "--preview", "4").assert_success()?;
    assert!(truncated.contains_stdout("+[user]: refa..."));
    Ok(())
}

#[test]
fn gc_reports_then_sweeps_orphans() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    create(&project, &["s1", "kept"])?;

    let orphan = project.store_dir().join("01HXKJ7NVQW3Y2YMZK5VFZX3G8");
    fs::create_dir_all(&orphan)?;
    fs::write(orphan.join("session.jsonl"), "{}\n")?;

    let report = bp!(project, "gc").assert_success()?;
    assert!(report.contains_stdout("--sweep"));
    assert!(orphan.exists());

    bp!(project, "gc", "--sweep").assert_success()?;
    assert!(!orphan.exists());
    assert_eq!(project.index().len(), 1);
    Ok(())
}

#[test]
fn gc_sweep_refused_on_corrupt_index() -> Result<()> {
    let project = TestProject::new();
    project.write_session("s1", TURNS);
    let id = create(&project, &["s1", "kept"])?;
    fs::write(project.store_dir().join("index.json"), "[{\"checkpoint_id\":")?;

    let report = bp!(project, "gc").assert_success()?;
    assert!(report.contains_stdout("index is damaged"));

    let result = bp!(project, "gc", "--sweep").assert_failure()?;
    assert!(result.contains_stderr("repair it before sweeping"));
    assert!(project.store_dir().join(&id).join("session.jsonl").is_file());
    Ok(())
}

#[test]
fn unknown_reference_fails() -> Result<()> {
    let project = TestProject::new();
    let result = bp!(project, "show", "01ZZZZZZ").assert_failure()?;
    assert!(result.contains_stderr("Unknown checkpoint reference"));
    Ok(())
}

#[test]
fn config_set_and_get() -> Result<()> {
    let project = TestProject::new();

    let value = bp!(project, "config", "get", "diff.context_lines").assert_success()?;
    assert_eq!(value.stdout.trim(), "3");

    bp!(project, "config", "set", "diff.context_lines", "5").assert_success()?;
    let value = bp!(project, "config", "get", "diff.context_lines").assert_success()?;
    assert_eq!(value.stdout.trim(), "5");
    assert!(project.config_path().is_file());

    bp!(project, "config", "set", "diff.preview_chars", "0").assert_failure()?;
    bp!(project, "config", "get", "no.such.key").assert_failure()?;
    Ok(())
}
