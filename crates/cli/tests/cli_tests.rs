#![expect(clippy::unwrap_used, reason = "test code")]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn storyflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("storyflow").unwrap();
    cmd.env("STORYFLOW_DB_PATH", dir.path().join("storyflow.db"))
        .env_remove("STORYFLOW_DATABASE_URL")
        .env_remove("STORYFLOW_STRATEGY")
        .env_remove("STORYFLOW_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("STORYFLOW_DEFAULT_PROMPT");
    cmd
}

fn run_json(dir: &TempDir, args: &[&str]) -> Value {
    let output = storyflow(dir).args(args).assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("storyflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pitch-to-article generation pipeline"));
}

#[test]
fn test_cli_queue_help() {
    let mut cmd = Command::cargo_bin("storyflow").unwrap();
    cmd.args(["queue", "enqueue", "--help"]).assert().success().stdout(predicate::str::contains("priority"));
}

#[test]
fn test_approve_enqueues_pitch() {
    let dir = TempDir::new().unwrap();
    let pitch = run_json(&dir, &["pitch", "create", "--category", "Fitness", "--text", "Home workouts"]);
    assert_eq!(pitch["status"], "pending");
    let id = pitch["id"].as_i64().unwrap().to_string();

    let outcome = run_json(&dir, &["pitch", "transition", &id, "approve"]);
    assert_eq!(outcome["pitch"]["status"], "approved");
    assert_eq!(outcome["queued"]["outcome"], "inserted");

    let stats = run_json(&dir, &["queue", "stats"]);
    assert_eq!(stats["pending"], 1);
}

#[test]
fn test_queue_show_by_id_and_pitch() {
    let dir = TempDir::new().unwrap();
    let pitch = run_json(&dir, &["pitch", "create", "--category", "Fitness", "--text", "Home workouts"]);
    let pitch_id = pitch["id"].as_i64().unwrap();
    let enqueued = run_json(&dir, &["queue", "enqueue", &pitch_id.to_string()]);
    assert_eq!(enqueued["outcome"], "inserted");

    let by_pitch = run_json(&dir, &["queue", "show", "--pitch", &pitch_id.to_string()]);
    assert_eq!(by_pitch["pitch_id"], pitch_id);
    assert_eq!(by_pitch["status"], "pending");

    let item_id = by_pitch["id"].as_i64().unwrap().to_string();
    let by_id = run_json(&dir, &["queue", "show", &item_id]);
    assert_eq!(by_id, by_pitch);

    storyflow(&dir)
        .args(["queue", "show", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("queue item 999 not found"));
    storyflow(&dir).args(["queue", "show", "--pitch", "999"]).assert().failure();
}

#[test]
fn test_unknown_status_is_rejected() {
    let dir = TempDir::new().unwrap();
    let pitch = run_json(&dir, &["pitch", "create", "--category", "Fitness", "--text", "Home workouts"]);
    let id = pitch["id"].as_i64().unwrap().to_string();

    storyflow(&dir).args(["pitch", "status", &id, "assign"]).assert().failure();
    let pitch = run_json(&dir, &["pitch", "show", &id]);
    assert_eq!(pitch["pitch"]["status"], "pending");
}

#[test]
fn test_prompt_templates_and_preview() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["prompt", "create", "--category", "Fitness", "--prompt", "Write about {pitch}"]);
    storyflow(&dir)
        .args(["prompt", "create", "--category", "Fitness", "--prompt", "Duplicate"])
        .assert()
        .failure();

    let templates = run_json(&dir, &["prompt", "list"]);
    assert_eq!(templates.as_array().unwrap().len(), 1);

    let pitch = run_json(&dir, &["pitch", "create", "--category", "Fitness", "--text", "Home workouts"]);
    let id = pitch["id"].as_i64().unwrap().to_string();
    let preview = run_json(&dir, &["pitch", "preview", &id]);
    assert_eq!(preview["text"], "Write about Home workouts");
}

#[test]
fn test_sweep_moves_approved_to_processing() {
    let dir = TempDir::new().unwrap();
    let pitch = run_json(&dir, &["pitch", "create", "--category", "Fitness", "--text", "Home workouts"]);
    let id = pitch["id"].as_i64().unwrap().to_string();
    run_json(&dir, &["pitch", "transition", &id, "approve"]);

    let report = run_json(&dir, &["sweep"]);
    assert_eq!(report["scanned"], 1);
    assert_eq!(report["already_queued"], 1);
    assert_eq!(report["transitioned"], 1);
}

#[test]
fn test_process_requires_api_key() {
    let dir = TempDir::new().unwrap();
    storyflow(&dir)
        .arg("process")
        .assert()
        .failure()
        .stderr(predicate::str::contains("generation backend is not configured"));
}
