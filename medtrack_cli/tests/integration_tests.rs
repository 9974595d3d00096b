//! Integration tests for the medtrack binary.
//!
//! These tests verify end-to-end behavior including:
//! - Adding medicines and reading daily views
//! - Status updates and their rejections
//! - Status log, export and adherence output
//! - Error reporting and exit codes

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI binary, isolated from any user config
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medtrack"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

const WEEKLY_MORNING: &str = r#"{
    "name": "Methotrexate",
    "dosage": "2.5mg",
    "frequency": "weekly",
    "timeSlots": { "morning": true },
    "duration": { "startDate": "2024-01-01", "endDate": "2024-01-22" }
}"#;

/// Add medicines from a JSON string and return the created entries
fn add(dir: &Path, user: &str, json: &str) -> Vec<Value> {
    let output = cli(dir)
        .args(["add", "--user", user])
        .write_stdin(json)
        .output()
        .expect("Failed to run add");
    assert!(output.status.success(), "add failed: {:?}", output);
    let created: Value = serde_json::from_slice(&output.stdout).unwrap();
    created.as_array().unwrap().clone()
}

fn view(dir: &Path, user: &str, date: &str) -> Value {
    let output = cli(dir)
        .args(["view", "--user", user, "--date", date])
        .output()
        .unwrap();
    assert!(output.status.success(), "view failed: {:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_cli_help() {
    let dir = setup_test_dir();
    Command::new(assert_cmd::cargo::cargo_bin!("medtrack"))
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Recurring medication schedule tracker",
        ));
}

#[test]
fn test_weekly_end_to_end() {
    let dir = setup_test_dir();
    let created = add(dir.path(), "alice", WEEKLY_MORNING);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["taken"].as_array().unwrap().len(), 22);
    let id = created[0]["id"].as_str().unwrap().to_string();

    let before = view(dir.path(), "alice", "2024-01-08");
    assert_eq!(before["morningCount"], 1);
    assert_eq!(before["morning"][0]["id"], id.as_str());
    assert_eq!(before["morning"][0]["isTaken"], false);

    cli(dir.path())
        .args(["mark", "--user", "alice", "--medicine", &id])
        .args(["--date", "2024-01-08", "--slot", "morning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"isTaken\": true"));

    let after = view(dir.path(), "alice", "2024-01-08");
    assert_eq!(after["morning"][0]["isTaken"], true);
    assert_eq!(after["totals"]["totalTaken"], 1);

    cli(dir.path())
        .args(["mark", "--user", "alice", "--medicine", &id])
        .args(["--date", "2024-01-09", "--slot", "morning"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[not_scheduled]"));
}

#[test]
fn test_mark_twice_is_idempotent() {
    let dir = setup_test_dir();
    let created = add(dir.path(), "bob", WEEKLY_MORNING);
    let id = created[0]["id"].as_str().unwrap().to_string();

    let mark = || {
        cli(dir.path())
            .args(["mark", "--user", "bob", "--medicine", &id])
            .args(["--date", "2024-01-15", "--slot", "morning"])
            .output()
            .unwrap()
    };
    let first = mark();
    let doc_after_first =
        fs::read_to_string(dir.path().join("data/schedules/bob.json")).unwrap();
    let second = mark();
    let doc_after_second =
        fs::read_to_string(dir.path().join("data/schedules/bob.json")).unwrap();

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(doc_after_first, doc_after_second);
}

#[test]
fn test_untaken_flag_clears_dose() {
    let dir = setup_test_dir();
    let created = add(dir.path(), "carol", WEEKLY_MORNING);
    let id = created[0]["id"].as_str().unwrap().to_string();

    for extra in [None, Some("--untaken")] {
        let mut cmd = cli(dir.path());
        cmd.args(["mark", "--user", "carol", "--medicine", &id])
            .args(["--date", "2024-01-01", "--slot", "morning"]);
        if let Some(flag) = extra {
            cmd.arg(flag);
        }
        cmd.assert().success();
    }

    let after = view(dir.path(), "carol", "2024-01-01");
    assert_eq!(after["morning"][0]["isTaken"], false);

    let log = fs::read_to_string(dir.path().join("data/status.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
}

#[test]
fn test_mark_out_of_range_and_bad_slot() {
    let dir = setup_test_dir();
    let created = add(dir.path(), "dave", WEEKLY_MORNING);
    let id = created[0]["id"].as_str().unwrap().to_string();

    for (date, slot, kind) in [
        ("2023-12-25", "morning", "out_of_range"),
        ("2024-01-29", "morning", "out_of_range"),
        ("2024-01-08", "brunch", "invalid_slot"),
        ("2024-01-08", "dinner", "invalid_slot"),
        ("2024-01-32", "morning", "invalid_date"),
    ] {
        cli(dir.path())
            .args(["mark", "--user", "dave", "--medicine", &id])
            .args(["--date", date, "--slot", slot])
            .assert()
            .code(2)
            .stderr(predicate::str::contains(format!("error[{}]", kind)));
    }

    assert!(!dir.path().join("data/status.log").exists());
}

#[test]
fn test_add_rejects_invalid_entries() {
    let dir = setup_test_dir();

    cli(dir.path())
        .args(["add", "--user", "erin"])
        .write_stdin(r#"[{"name": "X", "frequency": "hourly", "timeSlots": {"morning": true}, "duration": {"startDate": "2024-01-01", "endDate": "2024-01-02"}}]"#)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[invalid_frequency]"));

    cli(dir.path())
        .args(["add", "--user", "erin"])
        .write_stdin(r#"{"frequency": "daily"}"#)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[missing_field]"));

    assert!(!dir.path().join("data/schedules/erin.json").exists());
}

#[test]
fn test_add_from_file_appends() {
    let dir = setup_test_dir();
    let file = dir.path().join("meds.json");
    fs::write(
        &file,
        r#"[
            {"name": "A", "frequency": "daily", "timeSlots": {"morning": true, "dinner": true},
             "duration": {"startDate": "2024-03-01", "endDate": "2024-03-31"}},
            {"name": "B", "frequency": "monthly", "timeSlots": {"afternoon": true},
             "duration": {"startDate": "2024-01-15", "endDate": "2024-12-31"}}
        ]"#,
    )
    .unwrap();

    cli(dir.path())
        .args(["add", "--user", "frank", "--file"])
        .arg(&file)
        .assert()
        .success();
    add(dir.path(), "frank", WEEKLY_MORNING);

    let day = view(dir.path(), "frank", "2024-03-15");
    assert_eq!(day["morningCount"], 1);
    assert_eq!(day["afternoonCount"], 1);
    assert_eq!(day["dinnerCount"], 1);
    assert_eq!(day["afternoon"][0]["name"], "B");

    let show = cli(dir.path())
        .args(["show", "--user", "frank"])
        .output()
        .unwrap();
    let schedule: Value = serde_json::from_slice(&show.stdout).unwrap();
    assert_eq!(schedule["userId"], "frank");
    assert_eq!(schedule["medicines"].as_array().unwrap().len(), 3);
}

#[test]
fn test_view_unknown_user() {
    let dir = setup_test_dir();
    cli(dir.path())
        .args(["view", "--user", "nobody", "--date", "2024-01-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[not_found]"));
}

#[test]
fn test_adherence_and_export() {
    let dir = setup_test_dir();
    let created = add(dir.path(), "gina", WEEKLY_MORNING);
    let id = created[0]["id"].as_str().unwrap().to_string();

    cli(dir.path())
        .args(["mark", "--user", "gina", "--medicine", &id])
        .args(["--date", "2024-01-08", "--slot", "morning"])
        .assert()
        .success();

    let output = cli(dir.path())
        .args(["adherence", "--user", "gina", "--as-of", "2024-01-10"])
        .output()
        .unwrap();
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["dosesDue"], 2);
    assert_eq!(report["dosesTaken"], 1);
    assert_eq!(report["rate"], 0.5);

    cli(dir.path())
        .args(["export", "--user", "gina"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Methotrexate,2024-01-08,taken,,"))
        .stdout(predicate::str::contains("Methotrexate,2024-01-15,missed,,"));
}

#[test]
fn test_corrupted_schedule_reported_and_preserved() {
    let dir = setup_test_dir();
    let schedules = dir.path().join("data/schedules");
    fs::create_dir_all(&schedules).unwrap();
    fs::write(schedules.join("hank.json"), "{ invalid json }}}}").unwrap();

    cli(dir.path())
        .args(["view", "--user", "hank", "--date", "2024-01-01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[storage]"));

    let contents = fs::read_to_string(schedules.join("hank.json")).unwrap();
    assert_eq!(contents, "{ invalid json }}}}");
}

#[test]
fn test_lenient_config_allows_disabled_slot() {
    let dir = setup_test_dir();
    let config_path = dir.path().join("lenient.toml");
    fs::write(&config_path, "[schedule]\nstrict_time_slots = false\n").unwrap();

    let created = add(dir.path(), "ivy", WEEKLY_MORNING);
    let id = created[0]["id"].as_str().unwrap().to_string();

    cli(dir.path())
        .arg("--config")
        .arg(&config_path)
        .args(["mark", "--user", "ivy", "--medicine", &id])
        .args(["--date", "2024-01-08", "--slot", "dinner"])
        .assert()
        .success();

    // The view only reports enabled slots
    let day = view(dir.path(), "ivy", "2024-01-08");
    assert_eq!(day["dinnerCount"], 0);
}

#[test]
fn test_add_rejects_oversized_window() {
    let dir = setup_test_dir();
    let huge = r#"{"name": "X", "frequency": "daily", "timeSlots": {"morning": true},
        "duration": {"startDate": "0001-01-01", "endDate": "9999-12-31"}}"#;

    cli(dir.path())
        .args(["add", "--user", "jack"])
        .write_stdin(huge)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[invalid_duration]"));

    let config_path = dir.path().join("short.toml");
    fs::write(&config_path, "[schedule]\nmax_span_days = 7\n").unwrap();
    cli(dir.path())
        .arg("--config")
        .arg(&config_path)
        .args(["add", "--user", "jack"])
        .write_stdin(WEEKLY_MORNING)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[invalid_duration]"));

    assert!(!dir.path().join("data/schedules/jack.json").exists());
}
