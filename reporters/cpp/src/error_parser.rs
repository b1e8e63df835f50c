//! C/C++ ビルド診断から位置付きエラーを拾う
//!
//! GCC/Clang（列あり・なし）、MSVC（`C####`）、位置なしの `error:`、ツール名付きの
//! `collect2: error:`、CMake の `CMake Error at` に対応する。`note:` は直前のエラーに付ける。
//! 何も拾えなければ空を返し、フォールバックは共通の正規化に任せる。

use common::domain::CompilationError;
use common::normalize::strip_ansi;
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    gcc: Regex,
    gcc_no_col: Regex,
    msvc: Regex,
    tool: Regex,
    simple: Regex,
    cmake: Regex,
    note: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        gcc: Regex::new(r"^(.+?):(\d+):(\d+):\s*(?:fatal\s+)?error:\s*(.+)$").expect("gcc regex"),
        gcc_no_col: Regex::new(r"^(.+?):(\d+):\s*(?:fatal\s+)?error:\s*(.+)$")
            .expect("gcc regex"),
        msvc: Regex::new(r"^(.+?)\((\d+)(?:,(\d+))?\)\s*:\s*(?:fatal\s+)?error\s+(C\d+)\s*:\s*(.+)$")
            .expect("msvc regex"),
        tool: Regex::new(r"^([\w.+-]+):\s*(?:fatal\s+)?error:\s*(.+)$").expect("tool regex"),
        simple: Regex::new(r"^(?:fatal\s+)?error:\s*(.+)$").expect("simple regex"),
        cmake: Regex::new(r"^CMake Error(?: at (.+?):(\d+)(?: \(([\w-]+)\))?)?\s*:\s*(.*)$")
            .expect("cmake regex"),
        note: Regex::new(r"^\s*(?:.+?:\d+(?::\d+)?:\s*)?note:\s*(.+)$").expect("note regex"),
    })
}

fn is_boilerplate(line: &str) -> bool {
    line.contains("In file included from")
        || line.contains("In instantiation of")
        || line.contains("required from")
}

fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok()
}

/// 1 行をエラーとして読む。CMake のエラーは続く字下げ行を本文に取り込むので印を返す。
fn parse_error_line(line: &str) -> Option<(CompilationError, bool)> {
    let p = patterns();

    if let Some(c) = p.gcc.captures(line) {
        return Some((
            CompilationError {
                message: c[4].trim().to_string(),
                file: Some(c[1].to_string()),
                line: parse_u32(&c[2]),
                column: parse_u32(&c[3]),
                ..Default::default()
            },
            false,
        ));
    }
    if let Some(c) = p.gcc_no_col.captures(line) {
        return Some((
            CompilationError {
                message: c[3].trim().to_string(),
                file: Some(c[1].to_string()),
                line: parse_u32(&c[2]),
                ..Default::default()
            },
            false,
        ));
    }
    if let Some(c) = p.msvc.captures(line) {
        return Some((
            CompilationError {
                message: c[5].trim().to_string(),
                file: Some(c[1].to_string()),
                line: parse_u32(&c[2]),
                column: c.get(3).and_then(|m| parse_u32(m.as_str())),
                code: Some(c[4].to_string()),
                ..Default::default()
            },
            false,
        ));
    }
    if let Some(c) = p.cmake.captures(line) {
        let detail = c[4].trim();
        return Some((
            CompilationError {
                message: if detail.is_empty() {
                    "CMake configuration failed".to_string()
                } else {
                    detail.to_string()
                },
                file: c.get(1).map(|m| m.as_str().to_string()),
                line: c.get(2).and_then(|m| parse_u32(m.as_str())),
                code: c.get(3).map(|m| m.as_str().to_string()),
                ..Default::default()
            },
            true,
        ));
    }
    if let Some(c) = p.simple.captures(line) {
        return Some((CompilationError::message(c[1].trim()), false));
    }
    if let Some(c) = p.tool.captures(line) {
        return Some((
            CompilationError::message(format!("{}: {}", &c[1], c[2].trim())),
            false,
        ));
    }
    None
}

/// ビルド出力からエラーを拾う
pub fn parse_errors(raw: &str) -> Vec<CompilationError> {
    let text = strip_ansi(raw);
    let mut errors = Vec::new();
    let mut current: Option<CompilationError> = None;
    let mut indented_body = false;

    for line in text.lines() {
        if is_boilerplate(line) {
            continue;
        }
        if let Some((error, body)) = parse_error_line(line) {
            if let Some(done) = current.take() {
                errors.push(done);
            }
            current = Some(error);
            indented_body = body;
            continue;
        }
        let Some(err) = current.as_mut() else {
            continue;
        };
        if let Some(c) = patterns().note.captures(line) {
            err.append_note(c[1].trim());
        } else if indented_body && line.starts_with(char::is_whitespace) && !line.trim().is_empty()
        {
            err.append_note(line.trim());
        } else if indented_body && !line.trim().is_empty() {
            indented_body = false;
        }
    }
    if let Some(done) = current {
        errors.push(done);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcc_error_with_column() {
        let errors = parse_errors("src/calc.cpp:10:5: error: 'foo' was not declared in this scope\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file.as_deref(), Some("src/calc.cpp"));
        assert_eq!(errors[0].line, Some(10));
        assert_eq!(errors[0].column, Some(5));
        assert_eq!(errors[0].message, "'foo' was not declared in this scope");
        assert_eq!(errors[0].location().as_deref(), Some("src/calc.cpp:10:5"));
    }

    #[test]
    fn test_gcc_error_without_column_and_fatal() {
        let errors = parse_errors("main.cpp:3: fatal error: missing.hpp: No such file or directory\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, Some(3));
        assert_eq!(errors[0].column, None);
        assert_eq!(errors[0].message, "missing.hpp: No such file or directory");
    }

    #[test]
    fn test_msvc_error() {
        let errors = parse_errors("C:\\src\\main.cpp(42): error C2065: 'x': undeclared identifier\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file.as_deref(), Some("C:\\src\\main.cpp"));
        assert_eq!(errors[0].line, Some(42));
        assert_eq!(errors[0].code.as_deref(), Some("C2065"));
        assert_eq!(errors[0].message, "'x': undeclared identifier");

        let errors = parse_errors("main.cpp(7,12): error C2143: syntax error\n");
        assert_eq!(errors[0].column, Some(12));
    }

    #[test]
    fn test_simple_and_tool_errors() {
        let errors = parse_errors(
            "error: linker command failed\ncollect2: error: ld returned 1 exit status\n",
        );
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "linker command failed");
        assert_eq!(errors[0].file, None);
        assert_eq!(errors[1].message, "collect2: ld returned 1 exit status");
    }

    #[test]
    fn test_notes_attach_to_previous_error() {
        let raw = "\
In file included from src/main.cpp:1:
src/calc.hpp:4:7: error: redefinition of 'class Calc'
src/calc.hpp:4:7: note: previous definition of 'class Calc'
    4 | class Calc {
      |       ^~~~
note: candidate expects 2 arguments
";
        let errors = parse_errors(raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file.as_deref(), Some("src/calc.hpp"));
        assert_eq!(
            errors[0].note.as_deref(),
            Some("previous definition of 'class Calc'\ncandidate expects 2 arguments")
        );
    }

    #[test]
    fn test_boilerplate_is_ignored() {
        let raw = "\
src/a.cpp: In instantiation of 'void f(T) [with T = int]':
src/a.cpp:9:6:   required from here
src/a.cpp:3:5: error: no match for 'operator+'
";
        let errors = parse_errors(raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, Some(3));
    }

    #[test]
    fn test_ansi_colors_are_stripped() {
        let raw = "\x1b[01m\x1b[Ksrc/x.cpp:1:2:\x1b[m\x1b[K \x1b[01;31m\x1b[Kerror: \x1b[m\x1b[Kexpected ';'\n";
        let errors = parse_errors(raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file.as_deref(), Some("src/x.cpp"));
        assert_eq!(errors[0].message, "expected ';'");
    }

    #[test]
    fn test_cmake_error_collects_indented_body() {
        let raw = "\
CMake Error at CMakeLists.txt:5 (add_executable):
  Cannot find source file:

    src/missing.cpp

-- Configuring incomplete, errors occurred!
";
        let errors = parse_errors(raw);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file.as_deref(), Some("CMakeLists.txt"));
        assert_eq!(errors[0].line, Some(5));
        assert_eq!(errors[0].code.as_deref(), Some("add_executable"));
        assert_eq!(errors[0].message, "CMake configuration failed");
        assert_eq!(
            errors[0].note.as_deref(),
            Some("Cannot find source file:\nsrc/missing.cpp")
        );
    }

    #[test]
    fn test_nothing_recognizable() {
        assert!(parse_errors("undefined reference to `main'\n").is_empty());
        assert!(parse_errors("").is_empty());
    }
}
