//! シナリオごとの判定結果

use std::fmt::Write as _;
use std::path::PathBuf;

use common::domain::{CaseStatus, TestOutcome, TestResults};
use common::ports::outbound::{ExitKind, ProcessOutput};
use serde::Serialize;

use crate::profile::{Scenario, ScenarioFixture};

/// 1 シナリオの結果。`failures` が空なら合格。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub language: String,
    pub scenario: String,
    /// アーティファクトから読めた outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TestOutcome>,
    pub failures: Vec<String>,
    /// `--keep-temp` のときだけ残した作業ディレクトリ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 全シナリオの結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarnessReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl HarnessReport {
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }

    /// 人が読む要約（1 シナリオ 1 行、失敗理由は字下げして続ける）
    pub fn render(&self) -> String {
        let mut out = String::new();
        for s in &self.scenarios {
            let mark = if s.passed() { "PASS" } else { "FAIL" };
            let _ = writeln!(out, "{:<6}{:<20}{}", s.language, s.scenario, mark);
            for f in &s.failures {
                let _ = writeln!(out, "      - {}", f);
            }
            if let Some(dir) = &s.work_dir {
                let _ = writeln!(out, "      work dir: {}", dir.display());
            }
        }
        let passed = self.scenarios.iter().filter(|s| s.passed()).count();
        let _ = writeln!(out, "{} of {} scenarios passed", passed, self.scenarios.len());
        out
    }
}

/// アダプタの実行結果とアーティファクトを突き合わせる
///
/// `artifact` はアーティファクトの中身（読めなければ Err にその理由）。
pub fn check_scenario(
    fixture: &ScenarioFixture,
    piped: &[u8],
    adapter: &ProcessOutput,
    artifact: Result<String, String>,
) -> (Option<TestOutcome>, Vec<String>) {
    let mut failures = Vec::new();

    if adapter.status != ExitKind::Exited(0) {
        failures.push(format!(
            "adapter exited with {:?}: {}",
            adapter.status,
            String::from_utf8_lossy(&adapter.stderr).trim()
        ));
    }
    if adapter.stdout != piped {
        failures.push(format!(
            "passthrough differs from input ({} bytes piped, {} bytes replayed)",
            piped.len(),
            adapter.stdout.len()
        ));
    }

    let results: TestResults = match artifact
        .and_then(|text| serde_json::from_str(&text).map_err(|e| format!("artifact is not valid TestResults: {}", e)))
    {
        Ok(results) => results,
        Err(reason) => {
            failures.push(reason);
            return (None, failures);
        }
    };

    if !results.is_consistent() {
        failures.push("artifact violates the importError invariant".to_string());
    }
    let expected = fixture.scenario.expected_outcome();
    if results.outcome != expected {
        failures.push(format!(
            "outcome was {}, expected {}",
            results.outcome, expected
        ));
    }

    match fixture.scenario {
        Scenario::SinglePassing | Scenario::SingleFailing => {
            let want = if fixture.scenario == Scenario::SinglePassing {
                CaseStatus::Pass
            } else {
                CaseStatus::Fail
            };
            match results.cases.as_slice() {
                [case] => {
                    if case.status != want {
                        failures.push(format!("case '{}' has status {:?}", case.name, case.status));
                    }
                    if let Some(name) = fixture.expected_case {
                        if case.name != name {
                            failures.push(format!("case name was '{}', expected '{}'", case.name, name));
                        }
                    }
                    if want == CaseStatus::Fail && case.message.is_none() {
                        failures.push("failing case carries no message".to_string());
                    }
                }
                cases => failures.push(format!("expected exactly one case, found {}", cases.len())),
            }
        }
        Scenario::SingleImportError => {
            if !results.cases.is_empty() {
                failures.push(format!("expected no cases, found {}", results.cases.len()));
            }
            if results.raw_diagnostics.as_deref().map_or(true, str::is_empty) {
                failures.push("rawDiagnostics is missing or empty".to_string());
            }
        }
    }

    (Some(results.outcome), failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FixtureFile;
    use common::domain::{NormalizedReport, TestCaseResult};

    const NO_FILES: &[FixtureFile] = &[];

    fn fixture(scenario: Scenario, expected_case: Option<&'static str>) -> ScenarioFixture {
        ScenarioFixture {
            scenario,
            files: NO_FILES,
            expected_case,
        }
    }

    fn echo(piped: &[u8]) -> ProcessOutput {
        ProcessOutput {
            stdout: piped.to_vec(),
            stderr: Vec::new(),
            status: ExitKind::Exited(0),
        }
    }

    fn artifact(report: NormalizedReport) -> Result<String, String> {
        Ok(report.into_results("2026-01-01T00:00:00+00:00").to_json().unwrap())
    }

    #[test]
    fn test_passing_scenario_ok() {
        let report = NormalizedReport::from_cases(vec![TestCaseResult::pass("t")]).unwrap();
        let (outcome, failures) = check_scenario(
            &fixture(Scenario::SinglePassing, Some("t")),
            b"out",
            &echo(b"out"),
            artifact(report),
        );
        assert_eq!(outcome, Some(TestOutcome::Passed));
        assert!(failures.is_empty(), "{:?}", failures);
    }

    #[test]
    fn test_failing_scenario_requires_message() {
        let report =
            NormalizedReport::from_cases(vec![TestCaseResult::fail("t", None)]).unwrap();
        let (_, failures) = check_scenario(
            &fixture(Scenario::SingleFailing, Some("t")),
            b"",
            &echo(b""),
            artifact(report),
        );
        assert_eq!(failures, vec!["failing case carries no message".to_string()]);
    }

    #[test]
    fn test_import_scenario_ok() {
        let report = NormalizedReport::import_error(
            "error: boom",
            Vec::new(),
            common::domain::CompilationError::message("Compilation failed"),
        );
        let (outcome, failures) = check_scenario(
            &fixture(Scenario::SingleImportError, None),
            b"error: boom",
            &echo(b"error: boom"),
            artifact(report),
        );
        assert_eq!(outcome, Some(TestOutcome::ImportError));
        assert!(failures.is_empty(), "{:?}", failures);
    }

    #[test]
    fn test_adapter_contract_violations_are_reported() {
        let report = NormalizedReport::from_cases(vec![TestCaseResult::pass("other")]).unwrap();
        let adapter = ProcessOutput {
            stdout: b"truncated".to_vec(),
            stderr: b"tdd-guard-cpp: failed to write".to_vec(),
            status: ExitKind::Exited(74),
        };
        let (_, failures) = check_scenario(
            &fixture(Scenario::SingleFailing, Some("t")),
            b"truncated output",
            &adapter,
            artifact(report),
        );
        let expected = [
            "Exited(74)",
            "passthrough differs",
            "outcome was passed, expected failed",
            "case 'other' has status Pass",
            "case name was 'other', expected 't'",
            "failing case carries no message",
        ];
        assert_eq!(failures.len(), expected.len(), "{:?}", failures);
        for (failure, want) in failures.iter().zip(expected) {
            assert!(failure.contains(want), "{:?} does not mention {:?}", failure, want);
        }
    }

    #[test]
    fn test_missing_artifact() {
        let (outcome, failures) = check_scenario(
            &fixture(Scenario::SinglePassing, None),
            b"",
            &echo(b""),
            Err("artifact missing".to_string()),
        );
        assert_eq!(outcome, None);
        assert_eq!(failures, vec!["artifact missing".to_string()]);
    }

    #[test]
    fn test_render_summary() {
        let report = HarnessReport {
            scenarios: vec![
                ScenarioReport {
                    language: "rust".to_string(),
                    scenario: "singlePassing".to_string(),
                    outcome: Some(TestOutcome::Passed),
                    failures: Vec::new(),
                    work_dir: None,
                },
                ScenarioReport {
                    language: "cpp".to_string(),
                    scenario: "singleFailing".to_string(),
                    outcome: None,
                    failures: vec!["artifact missing".to_string()],
                    work_dir: None,
                },
            ],
        };
        assert!(!report.all_passed());
        let text = report.render();
        assert!(text.contains("rust  singlePassing       PASS"));
        assert!(text.contains("      - artifact missing"));
        assert!(text.ends_with("1 of 2 scenarios passed\n"));
    }
}
