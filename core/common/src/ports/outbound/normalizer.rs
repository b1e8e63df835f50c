//! 結果正規化 Outbound ポート（言語ごとに 1 実装）
//!
//! ネイティブのテストランナー出力を `TestCaseResult` 列に変換する部分だけを言語側が持つ。
//! ImportError への畳み込み・フォールバックは `common::normalize` が共通で行う。

use crate::domain::{CompilationError, TestCaseResult};

/// 構造化ペイロードを取り出せなかった理由
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("No JSON test output detected")]
    PayloadMissing,
    #[error("Malformed test output: {0}")]
    Malformed(String),
}

/// 言語ごとの正規化器
pub trait ResultNormalizer: Send + Sync {
    /// ログ用の名前（例: "cpp", "rust"）
    fn language(&self) -> &'static str;

    /// テスト実行の出力からケースを実行順に取り出す。
    ///
    /// 非 JSON 行が混ざっていてもよい。スキップ扱いのケースは含めない。
    fn parse_test_run(&self, raw: &str) -> Result<Vec<TestCaseResult>, ParseFailure>;

    /// ビルド診断から位置付きエラーを拾う（見つからなければ空）
    fn extract_compilation_errors(&self, raw: &str) -> Vec<CompilationError>;
}
