//! Runs the `schemalint` binary against files in a temporary directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn schemalint(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemalint"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute schemalint")
}

fn records(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("record is not JSON"))
        .collect()
}

#[test]
fn clean_document_exits_zero() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.yaml"), "x: {$ref: 'b.yaml#/y'}\n").unwrap();
    fs::write(temp.path().join("b.yaml"), "y: 1\n").unwrap();

    let output = schemalint(temp.path(), &["a.yaml"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn resolution_error_fails_the_run() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.yaml"), "x: {$ref: missing.yaml}\n").unwrap();

    let output = schemalint(temp.path(), &["a.yaml", "-o", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let records = records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "ERROR");
    assert_eq!(records[0]["cls"], "ResolutionError");
    assert_eq!(records[0]["filename"], "a.yaml");
    assert_eq!(records[0]["where"], serde_json::json!(["a.yaml:1"]));
}

#[test]
fn always_success_masks_failures() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.yaml"), "x: {$ref: missing.yaml}\n").unwrap();

    let output = schemalint(temp.path(), &["a.yaml", "--always-success"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("status:ERROR\tcls:ResolutionError\tfilename:a.yaml\t"));
}

#[test]
fn schema_violation_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.yaml"), "name: demo\ncount: ten\n").unwrap();
    fs::write(
        temp.path().join("schema.json"),
        r#"{"type": "object", "properties": {"count": {"type": "integer"}}}"#,
    )
    .unwrap();

    let output = schemalint(temp.path(), &["a.yaml", "--schema", "schema.json", "-o", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let records = records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["cls"], "ValidationError");
    assert_eq!(records[0]["start"], "2@8");
    assert_eq!(records[0]["end"], "2@11");
}

#[test]
fn guessed_schema_is_announced_and_used() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".schemalint.toml"), "schema = \"schema.yaml\"\n").unwrap();
    fs::write(temp.path().join("schema.yaml"), "required: [name]\n").unwrap();
    fs::write(temp.path().join("a.yaml"), "title: untitled\n").unwrap();

    let output = schemalint(temp.path(), &["a.yaml", "-g", "-o", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let records = records(&output);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["cls"], "MessageError");
    assert_eq!(records[0]["status"], "INFO");
    assert!(records[0]["msg"].as_str().unwrap().starts_with("schema discovered: "));
    assert_eq!(records[1]["cls"], "ValidationError");
    assert!(
        records[1]["msg"]
            .as_str()
            .unwrap()
            .ends_with("(validator=required)")
    );
}

#[test]
fn internal_failure_with_always_success_is_one_record() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.yaml"), "x: 1\n").unwrap();

    let output = schemalint(
        temp.path(),
        &["a.yaml", "-s", "no-such-schema.json", "--always-success", "-o", "json"],
    );
    assert_eq!(output.status.code(), Some(1));
    let records = records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "ERROR");
    assert_eq!(records[0]["cls"], "MessageError");
    assert!(records[0]["msg"].as_str().unwrap().contains("no-such-schema.json"));
}

#[test]
fn internal_failure_propagates_without_always_success() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.yaml"), "x: 1\n").unwrap();

    let output = schemalint(temp.path(), &["a.yaml", "-s", "no-such-schema.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Failed to load schema"), "{}", stderr);
}
