//! TDD Guard レポーターの適合性ハーネス
//!
//! 正規シナリオ（単一の成功・単一の失敗・単一のビルドエラー）をフィクスチャで再現し、
//! レポーターの終了コード・パススルー・`test.json` を検証する。

pub mod cli;
pub mod fixture;
pub mod harness;
pub mod profile;
pub mod report;
