//! C++ 向け TDD Guard レポーター
//!
//! GoogleTest / Catch2 の JSON と、GCC/Clang/MSVC/CMake のビルド診断を正規形にする。

pub mod error_parser;
pub mod parser;
pub mod probe;

use common::domain::{CompilationError, TestCaseResult};
use common::ports::outbound::{ParseFailure, ResultNormalizer};

pub use probe::CmakeProbe;

/// C++ の正規化器
#[derive(Debug, Clone, Default)]
pub struct CppNormalizer;

impl ResultNormalizer for CppNormalizer {
    fn language(&self) -> &'static str {
        "cpp"
    }

    fn parse_test_run(&self, raw: &str) -> Result<Vec<TestCaseResult>, ParseFailure> {
        parser::parse(raw)
    }

    fn extract_compilation_errors(&self, raw: &str) -> Vec<CompilationError> {
        error_parser::parse_errors(raw)
    }
}
