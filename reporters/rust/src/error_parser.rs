//! rustc / cargo のビルド診断から位置付きエラーを拾う
//!
//! `error[E0425]: ...` の後に続く最初の `--> file:line:col` を位置とする。
//! `= note:` / `= help:` は直前のエラーの note に付ける。警告と
//! `could not compile` / `aborting due to` などの締めくくり行は無視する。

use common::domain::CompilationError;
use common::normalize::strip_ansi;
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    header: Regex,
    location: Regex,
    annotation: Regex,
    other_header: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        header: Regex::new(r"^error(?:\[(E\d{4})\])?:\s*(.+)$").expect("header regex"),
        location: Regex::new(r"^\s*-->\s*(.+?):(\d+):(\d+)\s*$").expect("location regex"),
        annotation: Regex::new(r"^\s*=\s*(note|help):\s*(.+)$").expect("annotation regex"),
        other_header: Regex::new(r"^(?:warning|note|help)(?:\[[^\]]+\])?:").expect("other regex"),
    })
}

/// エラーではなく cargo / rustc の締めくくり
fn is_summary(message: &str) -> bool {
    message.starts_with("could not compile")
        || message.starts_with("aborting due to")
        || message.starts_with("Some errors have detailed explanations")
        || message.starts_with("For more information about this error")
}

/// ビルド出力からエラーを拾う
pub fn parse_errors(raw: &str) -> Vec<CompilationError> {
    let p = patterns();
    let text = strip_ansi(raw);
    let mut errors = Vec::new();
    let mut current: Option<CompilationError> = None;

    for line in text.lines() {
        if let Some(c) = p.header.captures(line) {
            if let Some(done) = current.take() {
                errors.push(done);
            }
            let message = c[2].trim();
            if is_summary(message) {
                continue;
            }
            current = Some(CompilationError {
                message: message.to_string(),
                code: c.get(1).map(|m| m.as_str().to_string()),
                ..Default::default()
            });
            continue;
        }
        if p.other_header.is_match(line) {
            // 警告の `-->` や注記を前のエラーに混ぜない
            if let Some(done) = current.take() {
                errors.push(done);
            }
            continue;
        }
        let Some(err) = current.as_mut() else {
            continue;
        };
        if let Some(c) = p.location.captures(line) {
            if err.file.is_none() {
                err.file = Some(c[1].to_string());
                err.line = c[2].parse().ok();
                err.column = c[3].parse().ok();
            }
        } else if let Some(c) = p.annotation.captures(line) {
            err.append_note(&format!("{}: {}", &c[1], c[2].trim()));
        }
    }
    if let Some(done) = current {
        errors.push(done);
    }
    errors
}
