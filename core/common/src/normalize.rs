//! 生出力 → 正規形（NormalizedReport）の共通部分
//!
//! 言語側の `ResultNormalizer` はケースの取り出しと診断の抽出だけを担い、
//! ImportError への畳み込み・フォールバック文言・タイムアウト診断はここで一元化する。
//! 入力が同じなら結果も同じ（時刻や環境に依存しない）。

use crate::domain::{CompilationError, NormalizedReport, StageHint};
use crate::ports::outbound::{ParseFailure, ResultNormalizer};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub const BUILD_FAILED: &str = "Compilation failed";
pub const PARSE_FAILED: &str = "Failed to parse test output";
pub const NO_OUTPUT: &str = "No test output received";
pub const NO_CASES: &str = "No test cases found in test output";

/// 先頭から試す JSON 候補行の上限
const MAX_JSON_CANDIDATES: usize = 64;

/// 生出力を正規化する
pub fn normalize<N: ResultNormalizer + ?Sized>(
    normalizer: &N,
    raw: &[u8],
    hint: StageHint,
) -> NormalizedReport {
    let text = String::from_utf8_lossy(raw);
    match hint {
        StageHint::BuildFailure => build_failure(normalizer, &text),
        StageHint::TimedOut { stage, limit } => {
            let summary = format!("{} stage timed out after {}s", stage, limit.as_secs());
            NormalizedReport::import_error(
                format!("tdd-guard: {}\n{}", summary, text),
                Vec::new(),
                CompilationError::message(summary),
            )
        }
        StageHint::TestRun | StageHint::Auto => match normalizer.parse_test_run(&text) {
            Ok(cases) => match NormalizedReport::from_cases(cases) {
                Some(report) => report,
                None => NormalizedReport::import_error(
                    text.as_ref(),
                    Vec::new(),
                    CompilationError::message(NO_CASES),
                ),
            },
            Err(failure) => parse_failure(normalizer, &text, &failure),
        },
    }
}

/// 解析上限を超えた入力。先頭 `head` だけを rawDiagnostics に残す。
pub fn oversized(head: &[u8], total_bytes: u64, limit_bytes: u64) -> NormalizedReport {
    NormalizedReport::import_error(
        String::from_utf8_lossy(head).into_owned(),
        Vec::new(),
        CompilationError::message(format!(
            "Test output exceeds the {} MiB parse limit",
            limit_bytes / (1024 * 1024)
        ))
        .with_note(format!("{} bytes received", total_bytes)),
    )
}

fn build_failure<N: ResultNormalizer + ?Sized>(normalizer: &N, text: &str) -> NormalizedReport {
    let errors = normalizer.extract_compilation_errors(text);
    let fallback = if text.trim().is_empty() {
        CompilationError::message(BUILD_FAILED).with_note("Build failed without diagnostics")
    } else {
        CompilationError::message(BUILD_FAILED).with_note(strip_ansi(text))
    };
    NormalizedReport::import_error(text, errors, fallback)
}

fn parse_failure<N: ResultNormalizer + ?Sized>(
    normalizer: &N,
    text: &str,
    failure: &ParseFailure,
) -> NormalizedReport {
    if text.trim().is_empty() {
        return NormalizedReport::import_error(
            text,
            Vec::new(),
            CompilationError::message(NO_OUTPUT).with_note(failure.to_string()),
        );
    }
    let errors = normalizer.extract_compilation_errors(&non_json_lines(text));
    NormalizedReport::import_error(
        text,
        errors,
        CompilationError::message(PARSE_FAILED).with_note(failure.to_string()),
    )
}

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid ANSI regex"))
}

/// ANSI エスケープ（色付け）を取り除く
pub fn strip_ansi(text: &str) -> String {
    ansi_re().replace_all(text, "").into_owned()
}

/// JSON の断片に見える行（`{ } [ ] "` で始まる行）を除いた残り
pub fn non_json_lines(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed.as_bytes()[0], b'{' | b'}' | b'[' | b']' | b'"') {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// 非 JSON 行が前後に混ざったテキストから、`accept` を満たす最初の JSON オブジェクトを探す。
///
/// 候補は行頭が `{` の行（無ければ最初の `{`）。候補から 1 値だけ読み、後ろのゴミは無視する。
/// 受理できるものが無く、壊れた候補があれば `Malformed`、候補が無ければ `PayloadMissing`。
pub fn find_json_document<F>(text: &str, accept: F) -> Result<Value, ParseFailure>
where
    F: Fn(&Value) -> bool,
{
    let mut starts: Vec<usize> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.starts_with('{') {
            starts.push(offset);
        }
        offset += line.len();
    }
    if starts.is_empty() {
        if let Some(pos) = text.find('{') {
            starts.push(pos);
        }
    }

    let mut first_error: Option<String> = None;
    for start in starts.into_iter().take(MAX_JSON_CANDIDATES) {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.is_object() && accept(&value) => return Ok(value),
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
            None => {}
        }
    }
    match first_error {
        Some(e) => Err(ParseFailure::Malformed(e)),
        None => Err(ParseFailure::PayloadMissing),
    }
}

/// 1 行 1 オブジェクトの JSON ストリーム（libtest など）から、オブジェクトとして読める行だけを返す
pub fn json_lines(text: &str) -> impl Iterator<Item = Value> + '_ {
    text.lines().filter_map(|line| {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        serde_json::from_str::<Value>(trimmed)
            .ok()
            .filter(Value::is_object)
    })
}
