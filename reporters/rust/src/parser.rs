//! libtest の JSON イベント列（`-Z unstable-options --format json`）を読む
//!
//! 1 行 1 イベント。cargo の進捗（`Compiling ...`, `Running ...`）は stderr 側に混ざってよい。
//! `type: "suite"` が 1 つも無ければペイロード無しとみなす。
//! 途中でテストバイナリが落ちた場合（stack overflow・SIGABRT など）、結果の無い実行中テストは
//! 失敗として残し、実行中テストも無く suite が閉じていなければ壊れた出力として扱う。

use std::collections::HashMap;

use common::domain::TestCaseResult;
use common::normalize::json_lines;
use common::ports::outbound::ParseFailure;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Event {
    Suite {
        event: String,
    },
    Test {
        name: String,
        event: String,
        #[serde(default)]
        stdout: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// 制限時間の警告だけが出て結果が届かなかったテストのメッセージ
pub const TIMED_OUT_MESSAGE: &str = "test exceeded the time limit without reporting a result";
/// 開始したまま結果が届かなかったテストのメッセージ
pub const NO_RESULT_MESSAGE: &str = "test did not report a result (the test binary may have crashed)";

/// 失敗メッセージ: 捕捉された stdout（panic の文面）と `message`
fn failure_message(stdout: Option<String>, message: Option<String>) -> Option<String> {
    let parts: Vec<String> = [stdout, message]
        .into_iter()
        .flatten()
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// 生出力からテストケースを取り出す
pub fn parse(raw: &str) -> Result<Vec<TestCaseResult>, ParseFailure> {
    let mut saw_suite = false;
    // 最後の suite が started のまま閉じていない
    let mut suite_open = false;
    let mut cases: Vec<TestCaseResult> = Vec::new();
    // timeout 警告で仮置きしたケースの位置（最終結果で上書きする）
    let mut pending: HashMap<String, usize> = HashMap::new();
    // started を受けてまだ結果の無いテスト（開始順）
    let mut running: Vec<String> = Vec::new();

    for value in json_lines(raw) {
        let Ok(event) = serde_json::from_value::<Event>(value) else {
            continue;
        };
        let (name, kind, stdout, message) = match event {
            Event::Suite { event } => {
                saw_suite = true;
                suite_open = event == "started";
                running.clear();
                continue;
            }
            Event::Test {
                name,
                event,
                stdout,
                message,
            } => (name, event, stdout, message),
            Event::Other => continue,
        };

        let result = match kind.as_str() {
            "started" => {
                running.push(name);
                continue;
            }
            "ok" | "allowed_fail" => TestCaseResult::pass(&name),
            "failed" => TestCaseResult::fail(&name, failure_message(stdout, message)),
            "timeout" => {
                running.retain(|n| *n != name);
                if !pending.contains_key(&name) {
                    pending.insert(name.clone(), cases.len());
                    cases.push(TestCaseResult::fail(&name, Some(TIMED_OUT_MESSAGE.to_string())));
                }
                continue;
            }
            "ignored" => {
                running.retain(|n| *n != name);
                continue;
            }
            _ => continue,
        };
        running.retain(|n| *n != name);
        match pending.remove(&name) {
            Some(index) => cases[index] = result,
            None => cases.push(result),
        }
    }

    if !saw_suite {
        return Err(ParseFailure::PayloadMissing);
    }
    if suite_open {
        if running.is_empty() && pending.is_empty() {
            return Err(ParseFailure::Malformed(
                "test run ended before the suite reported its result".to_string(),
            ));
        }
        for name in running {
            cases.push(TestCaseResult::fail(name, Some(NO_RESULT_MESSAGE.to_string())));
        }
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::CaseStatus;

    const STREAM: &str = r#"   Compiling calc v0.1.0 (/work/calc)
    Finished `test` profile [unoptimized + debuginfo] target(s) in 0.52s
     Running unittests src/lib.rs (target/debug/deps/calc-1234)
{ "type": "suite", "event": "started", "test_count": 3 }
{ "type": "test", "event": "started", "name": "tests::adds" }
{ "type": "test", "event": "started", "name": "tests::divides" }
{ "type": "test", "event": "started", "name": "tests::later" }
{ "type": "test", "name": "tests::adds", "event": "ok" }
{ "type": "test", "name": "tests::later", "event": "ignored" }
{ "type": "test", "name": "tests::divides", "event": "failed", "stdout": "\nthread 'tests::divides' panicked at src/lib.rs:12:9:\nassertion `left == right` failed\n  left: 2\n right: 3\n" }
{ "type": "suite", "event": "failed", "passed": 1, "failed": 1, "ignored": 1, "measured": 0, "filtered_out": 0, "exec_time": 0.001 }
"#;

    #[test]
    fn test_libtest_stream() {
        let cases = parse(STREAM).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0], TestCaseResult::pass("tests::adds"));
        assert_eq!(cases[1].name, "tests::divides");
        assert_eq!(cases[1].status, CaseStatus::Fail);
        let message = cases[1].message.as_deref().unwrap();
        assert!(message.contains("panicked at src/lib.rs:12:9"));
        assert!(message.ends_with("right: 3"));
    }

    #[test]
    fn test_failure_message_combines_stdout_and_message() {
        let raw = r#"{"type":"suite","event":"started","test_count":1}
{"type":"test","name":"t","event":"failed","stdout":"panic text\n","message":"test did not panic as expected"}
{"type":"suite","event":"failed","passed":0,"failed":1}"#;
        let cases = parse(raw).unwrap();
        assert_eq!(
            cases[0].message.as_deref(),
            Some("panic text\ntest did not panic as expected")
        );
    }

    #[test]
    fn test_timeout_warning_is_replaced_by_result() {
        let raw = r#"{"type":"suite","event":"started","test_count":2}
{"type":"test","event":"timeout","name":"slow"}
{"type":"test","event":"timeout","name":"stuck"}
{"type":"test","name":"slow","event":"ok"}"#;
        let cases = parse(raw).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0], TestCaseResult::pass("slow"));
        assert_eq!(cases[1].name, "stuck");
        assert_eq!(cases[1].message.as_deref(), Some(TIMED_OUT_MESSAGE));
    }

    #[test]
    fn test_multiple_test_binaries_keep_order() {
        let raw = r#"{"type":"suite","event":"started","test_count":1}
{"type":"test","name":"unit","event":"ok"}
{"type":"suite","event":"ok","passed":1,"failed":0}
     Running tests/cli.rs (target/debug/deps/cli-5678)
{"type":"suite","event":"started","test_count":1}
{"type":"test","name":"integration","event":"ok"}
{"type":"suite","event":"ok","passed":1,"failed":0}"#;
        let names: Vec<String> = parse(raw).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["unit", "integration"]);
    }

    #[test]
    fn test_suite_without_tests_is_empty() {
        let raw = r#"{"type":"suite","event":"started","test_count":0}
{"type":"suite","event":"ok","passed":0,"failed":0}"#;
        assert!(parse(raw).unwrap().is_empty());
    }

    #[test]
    fn test_crashed_binary_fails_unfinished_tests() {
        let raw = r#"{ "type": "suite", "event": "started", "test_count": 2 }
{ "type": "test", "event": "started", "name": "tests::a" }
{ "type": "test", "event": "started", "name": "tests::b" }
{ "type": "test", "name": "tests::a", "event": "ok" }

thread 'tests::b' has overflowed its stack
fatal runtime error: stack overflow
error: test failed, to rerun pass `--lib`

Caused by:
  process didn't exit successfully: `/work/calc/target/debug/deps/calc-1234 -Z unstable-options --format json` (signal: 6, SIGABRT: process abort signal)
"#;
        let cases = parse(raw).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0], TestCaseResult::pass("tests::a"));
        assert_eq!(cases[1].name, "tests::b");
        assert_eq!(cases[1].status, CaseStatus::Fail);
        assert_eq!(cases[1].message.as_deref(), Some(NO_RESULT_MESSAGE));
    }

    #[test]
    fn test_suite_cut_off_between_tests_is_malformed() {
        let raw = r#"{ "type": "suite", "event": "started", "test_count": 2 }
{ "type": "test", "event": "started", "name": "tests::a" }
{ "type": "test", "name": "tests::a", "event": "ok" }
"#;
        assert!(matches!(parse(raw), Err(ParseFailure::Malformed(_))));
    }

    #[test]
    fn test_ignored_test_is_not_left_running() {
        let raw = r#"{ "type": "suite", "event": "started", "test_count": 1 }
{ "type": "test", "event": "started", "name": "tests::later" }
{ "type": "test", "name": "tests::later", "event": "ignored" }
{ "type": "suite", "event": "ok", "passed": 0, "failed": 0, "ignored": 1 }
"#;
        assert!(parse(raw).unwrap().is_empty());
    }

    #[test]
    fn test_plain_cargo_output_has_no_payload() {
        let raw = "running 1 test\ntest tests::adds ... ok\n\ntest result: ok. 1 passed\n";
        assert_eq!(parse(raw).unwrap_err(), ParseFailure::PayloadMissing);
    }
}
