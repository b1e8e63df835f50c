//! Rust 向け TDD Guard レポーター
//!
//! libtest の JSON イベント列と rustc のビルド診断を正規形にする。

pub mod error_parser;
pub mod parser;
pub mod probe;

use common::domain::{CompilationError, TestCaseResult};
use common::ports::outbound::{ParseFailure, ResultNormalizer};

pub use probe::CargoProbe;

/// Rust の正規化器
#[derive(Debug, Clone, Default)]
pub struct RustNormalizer;

impl ResultNormalizer for RustNormalizer {
    fn language(&self) -> &'static str {
        "rust"
    }

    fn parse_test_run(&self, raw: &str) -> Result<Vec<TestCaseResult>, ParseFailure> {
        parser::parse(raw)
    }

    fn extract_compilation_errors(&self, raw: &str) -> Vec<CompilationError> {
        error_parser::parse_errors(raw)
    }
}
