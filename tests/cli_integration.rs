// CLI integration tests for argument handling and backend bootstrap failures.
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_waitforservice");
    let mut command = Command::new(exe);
    command.env_remove("WAITFORSERVICE_VALUE").env_remove("RUST_LOG");
    command
}

fn parse_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().last().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

#[test]
fn no_patterns_prints_usage_and_exits_1() {
    let temp = tempfile::tempdir().expect("tempdir");
    let marker = temp.path().join("never-created");

    let output = cmd()
        .args(["--ready-marker", marker.to_str().unwrap()])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PATTERN"), "stderr: {stderr}");
}

#[test]
fn help_exits_0() {
    let output = cmd().arg("--help").output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("WAITFORSERVICE_VALUE"));
    assert!(!stdout.contains("hybris-lib"));
}

#[test]
fn unknown_flag_is_usage_error() {
    let output = cmd().args(["--bogus", "foo.bar"]).output().expect("run");
    assert_eq!(output.status.code(), Some(1));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
}

#[test]
fn missing_native_library_is_fatal_and_reported() {
    let temp = tempfile::tempdir().expect("tempdir");
    let marker = temp.path().join("property_service");
    std::fs::write(&marker, b"").expect("marker");

    let output = cmd()
        .args([
            "--ready-marker",
            marker.to_str().unwrap(),
            "--hybris-lib",
            "/nonexistent/libhybris-common.so.1",
            "init.svc.*",
        ])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Unavailable");
    assert!(
        err["error"]["message"]
            .as_str()
            .unwrap()
            .contains("/nonexistent/libhybris-common.so.1")
    );
    assert!(err["error"]["hint"].is_string());
    assert_eq!(err["error"]["path"], "/nonexistent/libhybris-common.so.1");
}

#[test]
fn completions_skip_backend() {
    let output = cmd()
        .args(["--completions", "bash"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("waitforservice"));
}
