use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use common::domain::{TestOutcome, TestResults};

const BIN: &str = env!("CARGO_BIN_EXE_tdd-guard-rust");

fn run_reporter(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(BIN)
        .args(args)
        .env_remove("TDD_GUARD_LOG_FILE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn reporter");
    if let Some(mut pipe) = child.stdin.take() {
        let _ = pipe.write_all(stdin);
    }
    child.wait_with_output().expect("wait reporter")
}

fn artifact(root: &Path) -> TestResults {
    let text = std::fs::read_to_string(root.join(".claude/tdd-guard/data/test.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_failing_libtest_stream_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let input = "\
     Running unittests src/lib.rs (target/debug/deps/calc-1234)
{ \"type\": \"suite\", \"event\": \"started\", \"test_count\": 1 }
{ \"type\": \"test\", \"event\": \"started\", \"name\": \"tests::divides\" }
{ \"type\": \"test\", \"name\": \"tests::divides\", \"event\": \"failed\", \"stdout\": \"thread 'tests::divides' panicked at src/lib.rs:9:9:\\nassertion failed\\n\" }
{ \"type\": \"suite\", \"event\": \"failed\", \"passed\": 0, \"failed\": 1 }
";

    let out = run_reporter(
        &["--project-root", dir.path().to_str().unwrap(), "--passthrough"],
        input.as_bytes(),
    );

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(out.stdout, input.as_bytes());
    let results = artifact(dir.path());
    assert_eq!(results.outcome, TestOutcome::Failed);
    assert_eq!(results.cases.len(), 1);
    assert!(results.cases[0]
        .message
        .as_deref()
        .unwrap()
        .contains("assertion failed"));
    assert!(results.is_consistent());
}

#[test]
fn test_rustc_error_is_import_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = "error[E0425]: cannot find value `x` in this scope\n --> src/lib.rs:3:5\n";

    let out = run_reporter(
        &[
            "--project-root",
            dir.path().to_str().unwrap(),
            "--stage",
            "build",
        ],
        input.as_bytes(),
    );

    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
    let results = artifact(dir.path());
    assert_eq!(results.outcome, TestOutcome::ImportError);
    assert_eq!(results.compilation_errors[0].code.as_deref(), Some("E0425"));
    assert_eq!(results.compilation_errors[0].line, Some(3));
}

#[test]
fn test_nonexistent_project_root_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let out = run_reporter(&["--project-root", missing.to_str().unwrap()], b"");
    assert_eq!(out.status.code(), Some(64));
    assert!(!missing.exists());
}

#[test]
fn test_help_exits_zero() {
    let out = run_reporter(&["--help"], b"");
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("--project-root"));
}
