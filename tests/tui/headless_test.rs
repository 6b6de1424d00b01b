//! Integration tests for headless mode.

use super::common::{run_headless, run_headless_json};
use std::io::Write;

#[test]
fn test_headless_basic_execution() {
    let (code, stdout, _) = run_headless(&["--events", "key:tab"]);

    assert_eq!(code, 0, "Expected exit code 0");
    assert!(stdout.contains("DataQuest"));
    assert!(stdout.contains("Enter Your Question"));
    assert!(
        stdout.contains("Events: 1 executed"),
        "Should show events executed"
    );
    assert!(stdout.contains("Phase: Idle"));
}

#[test]
fn test_headless_generate() {
    let (code, stdout, stderr) = run_headless(&[
        "--events",
        "type:List all students,key:enter,assert:contains:FROM student",
    ]);

    assert_eq!(code, 0, "stdout:\n{stdout}\nstderr:\n{stderr}");
    assert!(stdout.contains("Generated SQL Query"));
    assert!(stdout.contains("SELECT name, team FROM student;"));
    assert!(stdout.contains("Phase: AwaitingEdit"));
}

#[test]
fn test_headless_generate_and_execute() {
    let (code, json) = run_headless_json(
        "type:List all students,key:enter,key:ctrl+e,assert:state:row_count=4",
    );

    assert_eq!(code, 0);
    assert_eq!(json["state"]["phase"], "ShowingResults");
    assert_eq!(json["state"]["has_results"], true);
    assert_eq!(json["state"]["row_count"], 4);
    assert_eq!(json["assertions"]["passed"], 1);

    let screen = json["screen"].as_str().unwrap();
    assert!(screen.contains("Query Results"));
    assert!(screen.contains("Dan Novak"));
    assert!(screen.contains("4 rows"));
}

#[test]
fn test_headless_generation_error() {
    let (code, json) = run_headless_json(
        "type:What is the weather,key:enter,assert:contains:Could not generate SQL",
    );

    assert_eq!(code, 0);
    assert_eq!(json["state"]["phase"], "ShowingError(Generate)");
    assert_eq!(json["state"]["feedback_loop"], true);
    assert_eq!(
        json["state"]["error_message"],
        "Could not generate SQL for: What is the weather"
    );
    assert!(json["state"]["generated_query"].is_null());
}

#[test]
fn test_headless_execute_error_then_retry() {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    write!(
        script,
        r#"# Break the table name, then let the backend fix it
type:List all students
key:enter
key:left
type:s
assert:state:editable_query=SELECT name, team FROM students;
key:ctrl+e
assert:contains:no such table: students
assert:contains:Ctrl+R: retry with error feedback
key:ctrl+r
assert:state:editable_query=SELECT name, team FROM student;
assert:not-contains:no such table
key:ctrl+e
assert:state:row_count=4
"#
    )
    .unwrap();

    let path = script.path().to_str().unwrap();
    let (code, stdout, stderr) = run_headless(&["--script", path]);

    assert_eq!(code, 0, "stdout:\n{stdout}\nstderr:\n{stderr}");
    assert!(stdout.contains("Assertions: 6 passed, 0 failed"));
    assert!(stdout.contains("Phase: ShowingResults"));
}

#[test]
fn test_headless_empty_query_is_not_executed() {
    let (code, json) = run_headless_json("key:ctrl+e,assert:state:phase=Idle");

    assert_eq!(code, 0);
    assert_eq!(json["state"]["has_results"], false);
    assert_eq!(json["state"]["loading"], false);
}

#[test]
fn test_headless_assertion_fail() {
    let (code, stdout, _) = run_headless(&[
        "--events",
        "type:List all projects,assert:contains:Query Results",
    ]);

    assert_eq!(code, 1, "Should exit with code 1 on assertion failure");
    assert!(stdout.contains("Assertions: 0 passed, 1 failed"));
    assert!(stdout.contains("FAILED: assert:contains:Query Results"));
}

#[test]
fn test_headless_fail_fast() {
    let (code, json) = {
        let (code, stdout, _) = run_headless(&[
            "--events",
            "assert:contains:nowhere,type:List all projects",
            "--output",
            "json",
            "--fail-fast",
        ]);
        (code, serde_json::from_str::<serde_json::Value>(&stdout).unwrap())
    };

    assert_eq!(code, 1);
    assert_eq!(json["events_executed"], 1);
    assert_eq!(json["state"]["question"], "");
}

#[test]
fn test_headless_custom_size() {
    let (code, json) = {
        let (code, stdout, _) = run_headless(&[
            "--events",
            "type:x",
            "--size",
            "60x20",
            "--output",
            "json",
        ]);
        (code, serde_json::from_str::<serde_json::Value>(&stdout).unwrap())
    };

    assert_eq!(code, 0);
    let lines = json["screen_lines"].as_array().unwrap();
    assert!(lines.len() <= 20);
    assert!(lines
        .iter()
        .all(|l| l.as_str().unwrap().chars().count() <= 60));
}

#[test]
fn test_headless_frames_output() {
    let (code, stdout, _) = run_headless(&[
        "--events",
        "type:List all projects,key:enter",
        "--output",
        "frames",
    ]);

    assert_eq!(code, 0);
    assert!(stdout.contains("=== FRAME 0 (initial) ==="));
    assert!(stdout.contains("=== FRAME 2 (key:enter) ==="));
    assert!(stdout.contains("Total: 3 frames, 2 events executed"));
}

#[test]
fn test_headless_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let out_str = out.to_str().unwrap();

    let (code, stdout, _) = run_headless(&["--events", "type:hello", "--output-file", out_str]);

    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("hello"));
}

#[test]
fn test_headless_requires_events() {
    let (code, _, stderr) = run_headless(&[]);

    assert_eq!(code, 1);
    assert!(stderr.contains("--headless requires --events or --script"));
}

#[test]
fn test_headless_invalid_event() {
    let (code, _, stderr) = run_headless(&["--events", "bogus:thing"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown event type"));
}
