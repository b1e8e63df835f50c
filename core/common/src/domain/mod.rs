//! ドメイン型（型と不変条件）
//!
//! 正規形のテスト結果・生出力・起動パラメータ。I/O は持たない。

pub mod capture;
pub mod invocation;
pub mod test_result;

pub use capture::{RawCapture, StageHint, StageKind};
pub use invocation::{InputMode, ProjectRoot, ReporterInvocation, DEFAULT_STAGE_TIMEOUT};
pub use test_result::{
    CaseStatus, CompilationError, NormalizedReport, TestCaseResult, TestOutcome, TestResults,
};
