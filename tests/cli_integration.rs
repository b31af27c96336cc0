//! Integration tests for the logsage CLI surface.

use std::process::Command;

fn run_help(args: &[&str]) -> String {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

#[test]
fn test_watch_command_help() {
    let combined = run_help(&["watch", "--help"]);
    assert!(
        combined.contains("--interval"),
        "Help should mention --interval flag"
    );
    assert!(combined.contains("<FILE>"), "Help should mention the file argument");
}

#[test]
fn test_capture_command_help() {
    let combined = run_help(&["capture", "--help"]);
    assert!(
        combined.contains("--file"),
        "Help should mention --file flag"
    );
    assert!(
        combined.contains("--interval"),
        "Help should mention --interval flag"
    );
}
