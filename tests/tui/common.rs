//! Common test utilities for TUI tests.

use std::process::Command;

/// Runs dataquest in headless mode against the mock backend.
///
/// Points `--config` at a path that does not exist so a user config file
/// cannot leak into the run.
pub fn run_headless(args: &[&str]) -> (i32, String, String) {
    let config_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = config_dir.path().join("config.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_dataquest"))
        .args(["--headless", "--mock-backend", "--config"])
        .arg(&config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

/// Runs headless mode and parses its JSON output.
pub fn run_headless_json(events: &str) -> (i32, serde_json::Value) {
    let (code, stdout, stderr) = run_headless(&["--events", events, "--output", "json"]);
    let json = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("Invalid JSON output ({e}):\n{stdout}\nstderr:\n{stderr}"));
    (code, json)
}
