//! テスト結果のドメイン型（正規化後の共通スキーマ）
//!
//! 全言語のレポーターが同じ形で `test.json` を書き出す。
//! `ImportError` ⇔ `cases` が空 ∧ `rawDiagnostics` あり、をコンストラクタで保証する。

use serde::{Deserialize, Serialize};

/// 1 回の実行の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestOutcome {
    Passed,
    Failed,
    /// テストが 1 件も走る前にビルド・ロードで失敗した
    ImportError,
}

impl TestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestOutcome::Passed => "passed",
            TestOutcome::Failed => "failed",
            TestOutcome::ImportError => "importError",
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// テストケース単位の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Pass,
    Fail,
}

/// テストケース 1 件（実行順に並ぶ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub name: String,
    pub status: CaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TestCaseResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Pass,
            message: None,
        }
    }

    pub fn fail(name: impl Into<String>, message: Option<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Fail,
            message: message.filter(|m| !m.is_empty()),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Pass
    }
}

/// ビルド診断から拾った位置付きエラー（ベストエフォート）
///
/// `rawDiagnostics` の代わりにはならない。ガードが要点を掴むための補助。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CompilationError {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// `note` に 1 行追記する
    pub fn append_note(&mut self, text: &str) {
        match self.note {
            Some(ref mut note) => {
                note.push('\n');
                note.push_str(text);
            }
            None => self.note = Some(text.to_string()),
        }
    }

    /// `file:line:column` 形式の位置（分かる範囲で）
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_ref()?;
        Some(match (self.line, self.column) {
            (Some(line), Some(col)) => format!("{}:{}:{}", file, line, col),
            (Some(line), None) => format!("{}:{}", file, line),
            _ => file.clone(),
        })
    }
}

/// 正規化の結果（タイムスタンプを含まない決定的な部分）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReport {
    outcome: TestOutcome,
    cases: Vec<TestCaseResult>,
    raw_diagnostics: Option<String>,
    compilation_errors: Vec<CompilationError>,
}

impl NormalizedReport {
    /// テストが走った場合。空の `cases` は受け付けない（呼び出し側で ImportError にする）。
    pub fn from_cases(cases: Vec<TestCaseResult>) -> Option<Self> {
        if cases.is_empty() {
            return None;
        }
        let outcome = if cases.iter().all(TestCaseResult::passed) {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed
        };
        Some(Self {
            outcome,
            cases,
            raw_diagnostics: None,
            compilation_errors: Vec::new(),
        })
    }

    /// ビルド・ロード失敗。`errors` が空ならフォールバックの 1 件を入れる。
    pub fn import_error(
        raw_diagnostics: impl Into<String>,
        mut errors: Vec<CompilationError>,
        fallback: CompilationError,
    ) -> Self {
        if errors.is_empty() {
            errors.push(fallback);
        }
        Self {
            outcome: TestOutcome::ImportError,
            cases: Vec::new(),
            raw_diagnostics: Some(raw_diagnostics.into()),
            compilation_errors: errors,
        }
    }

    pub fn outcome(&self) -> TestOutcome {
        self.outcome
    }

    pub fn cases(&self) -> &[TestCaseResult] {
        &self.cases
    }

    pub fn raw_diagnostics(&self) -> Option<&str> {
        self.raw_diagnostics.as_deref()
    }

    pub fn compilation_errors(&self) -> &[CompilationError] {
        &self.compilation_errors
    }

    /// 永続化する形に変換する
    pub fn into_results(self, timestamp: impl Into<String>) -> TestResults {
        TestResults {
            outcome: self.outcome,
            cases: self.cases,
            raw_diagnostics: self.raw_diagnostics,
            compilation_errors: self.compilation_errors,
            timestamp: timestamp.into(),
        }
    }
}

/// 正規形のアーティファクト（`<dataDir>/test.json`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub outcome: TestOutcome,
    pub cases: Vec<TestCaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_diagnostics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compilation_errors: Vec<CompilationError>,
    /// RFC3339 UTC
    pub timestamp: String,
}

impl TestResults {
    /// `ImportError` ⇔ `cases` が空 ∧ `rawDiagnostics` あり
    pub fn is_consistent(&self) -> bool {
        let import_error = self.outcome == TestOutcome::ImportError;
        let diag_shape = self.cases.is_empty() && self.raw_diagnostics.is_some();
        if import_error != diag_shape {
            return false;
        }
        match self.outcome {
            TestOutcome::Passed => self.cases.iter().all(TestCaseResult::passed),
            TestOutcome::Failed => self.cases.iter().any(|c| !c.passed()),
            TestOutcome::ImportError => true,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
