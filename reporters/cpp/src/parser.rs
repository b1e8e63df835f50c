//! GoogleTest / Catch2 の JSON レポートを読む
//!
//! ビルドや進捗の行が前後に混ざっていてもよい。最初に見つかった `testsuites`（GoogleTest）か
//! `test-run`（Catch2）を持つオブジェクトを採用する。スキップ・未実行のケースは結果に含めない。
//! 一覧の中の読めない要素（オブジェクトでない、型が違う）は飛ばし、残りを使う。

use common::domain::TestCaseResult;
use common::normalize::find_json_document;
use common::ports::outbound::ParseFailure;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 検出したテストフレームワーク
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    GoogleTest,
    Catch2,
}

impl Framework {
    fn detect(doc: &Value) -> Option<Self> {
        if doc.get("testsuites").is_some() {
            Some(Framework::GoogleTest)
        } else if doc.get("test-run").is_some() {
            Some(Framework::Catch2)
        } else {
            None
        }
    }
}

/// 生出力からテストケースを取り出す
pub fn parse(raw: &str) -> Result<Vec<TestCaseResult>, ParseFailure> {
    let doc = find_json_document(raw, |v| Framework::detect(v).is_some())?;
    match Framework::detect(&doc) {
        Some(Framework::GoogleTest) => Ok(googletest_cases(typed(doc)?)),
        Some(Framework::Catch2) => Ok(catch2_cases(typed(doc)?)),
        None => Err(ParseFailure::PayloadMissing),
    }
}

fn typed<T: DeserializeOwned>(doc: Value) -> Result<T, ParseFailure> {
    serde_json::from_value(doc).map_err(|e| ParseFailure::Malformed(e.to_string()))
}

fn readable_items<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// 配列でなければエラー。要素は読めるものだけ残す。
fn readable_array<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(readable_items(items)),
        _ => Err(de::Error::custom("expected an array")),
    }
}

/// 配列でなければ空
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(readable_items(items)),
        _ => Ok(Vec::new()),
    }
}

/// 型が合わなければ既定値
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

// --- GoogleTest -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GTestReport {
    #[serde(deserialize_with = "readable_array")]
    testsuites: Vec<GTestSuite>,
}

#[derive(Debug, Deserialize)]
struct GTestSuite {
    #[serde(default, deserialize_with = "lenient")]
    name: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    testsuite: Vec<GTestCase>,
}

#[derive(Debug, Deserialize)]
struct GTestCase {
    #[serde(default, deserialize_with = "lenient")]
    name: String,
    #[serde(default, deserialize_with = "lenient")]
    status: String,
    #[serde(default, deserialize_with = "lenient")]
    result: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    failures: Vec<GTestFailure>,
}

#[derive(Debug, Deserialize)]
struct GTestFailure {
    // gtest 本体は `failure`、古い変換ツールは `message` を使う
    #[serde(default, deserialize_with = "lenient")]
    failure: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
}

impl GTestCase {
    fn skipped(&self) -> bool {
        self.status == "NOTRUN" || self.result == "SKIPPED" || self.result == "SUPPRESSED"
    }
}

fn googletest_cases(report: GTestReport) -> Vec<TestCaseResult> {
    let mut cases = Vec::new();
    for suite in report.testsuites {
        for test in suite.testsuite {
            if test.skipped() {
                continue;
            }
            let name = if suite.name.is_empty() {
                test.name.clone()
            } else {
                format!("{}.{}", suite.name, test.name)
            };
            if test.failures.is_empty() {
                cases.push(TestCaseResult::pass(name));
            } else {
                let message = test
                    .failures
                    .into_iter()
                    .filter_map(|f| f.message.or(f.failure))
                    .collect::<Vec<_>>()
                    .join("\n");
                cases.push(TestCaseResult::fail(name, Some(message)));
            }
        }
    }
    cases
}

// --- Catch2 -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Catch2Report {
    #[serde(rename = "test-run")]
    test_run: Catch2Run,
}

#[derive(Debug, Deserialize)]
struct Catch2Run {
    #[serde(rename = "test-cases", deserialize_with = "readable_array")]
    test_cases: Vec<Catch2Case>,
}

#[derive(Debug, Deserialize)]
struct Catch2Case {
    #[serde(rename = "test-info", default, deserialize_with = "lenient")]
    test_info: Catch2Info,
    #[serde(default, deserialize_with = "lenient_vec")]
    runs: Vec<Catch2RunPath>,
    #[serde(default, deserialize_with = "lenient")]
    totals: Option<Catch2Totals>,
}

#[derive(Debug, Default, Deserialize)]
struct Catch2Info {
    #[serde(default, deserialize_with = "lenient")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Catch2RunPath {
    #[serde(default, deserialize_with = "lenient_vec")]
    path: Vec<Catch2PathItem>,
}

#[derive(Debug, Deserialize)]
struct Catch2PathItem {
    #[serde(default, deserialize_with = "lenient")]
    kind: String,
    #[serde(default, deserialize_with = "lenient")]
    name: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    path: Vec<Catch2PathItem>,
    #[serde(default, deserialize_with = "lenient")]
    status: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    expression: Option<Catch2Expression>,
}

#[derive(Debug, Deserialize)]
struct Catch2Expression {
    #[serde(default, deserialize_with = "lenient")]
    expanded: String,
}

#[derive(Debug, Deserialize)]
struct Catch2Totals {
    assertions: Catch2Counts,
}

#[derive(Debug, Default, Deserialize)]
struct Catch2Counts {
    #[serde(default, deserialize_with = "lenient")]
    passed: u64,
    #[serde(default, deserialize_with = "lenient")]
    failed: u64,
    #[serde(default, deserialize_with = "lenient")]
    skipped: u64,
}

impl Catch2Case {
    /// `TestCase/Section/Sub`（最初の run のセクション経路）
    fn full_name(&self) -> String {
        let sections = self
            .runs
            .first()
            .map(|run| section_names(&run.path))
            .unwrap_or_default();
        let test_name = &self.test_info.name;
        match sections.first() {
            None => test_name.clone(),
            Some(first) if test_name.is_empty() || first == test_name => sections.join("/"),
            Some(_) => format!("{}/{}", test_name, sections.join("/")),
        }
    }

    fn failure_messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        for run in &self.runs {
            collect_failed_assertions(&run.path, &mut out);
        }
        out
    }
}

/// 各階層のセクション名を上から順に。次の階層は最後のセクションの中をたどる。
fn section_names(mut level: &[Catch2PathItem]) -> Vec<String> {
    let mut names = Vec::new();
    loop {
        let mut next: Option<&[Catch2PathItem]> = None;
        for item in level.iter().filter(|i| i.kind == "section") {
            names.push(item.name.clone());
            next = Some(&item.path);
        }
        match next {
            Some(deeper) if !deeper.is_empty() => level = deeper,
            _ => return names,
        }
    }
}

fn collect_failed_assertions(items: &[Catch2PathItem], out: &mut Vec<String>) {
    for item in items {
        match item.kind.as_str() {
            "assertion" if item.status == Some(false) => {
                if let Some(expr) = item.expression.as_ref().filter(|e| !e.expanded.is_empty()) {
                    out.push(expr.expanded.clone());
                }
            }
            "section" => collect_failed_assertions(&item.path, out),
            _ => {}
        }
    }
}

fn catch2_cases(report: Catch2Report) -> Vec<TestCaseResult> {
    let mut cases = Vec::new();
    for case in report.test_run.test_cases {
        // totals が無いケースは実行状況が分からないので載せない
        let Some(totals) = case.totals.as_ref() else {
            continue;
        };
        let counts = &totals.assertions;
        if counts.skipped > 0 && counts.failed == 0 && counts.passed == 0 {
            continue;
        }
        let name = case.full_name();
        if counts.failed > 0 {
            let message = case.failure_messages().join("\n");
            cases.push(TestCaseResult::fail(name, Some(message)));
        } else {
            cases.push(TestCaseResult::pass(name));
        }
    }
    cases
}
