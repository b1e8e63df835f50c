//! TDD Guard レポーター共通ライブラリ
//!
//! 言語ごとのレポーター（`tdd-guard-cpp`, `tdd-guard-rust`）と適合性ハーネスで共有される、
//! 正規形の型・ポート・標準アダプタ・正規化・ステージ実行・レポートのユースケースを提供します。

/// エラーハンドリング
pub mod error;

/// ドメイン型（正規形のテスト結果・生出力・起動パラメータ）
pub mod domain;

/// Outbound ポート（trait）
pub mod ports;

/// 標準アダプタ（Std*）
pub mod adapter;

/// データディレクトリの解決
pub mod config;

/// 生出力の正規化（言語共通部分）
pub mod normalize;

/// プローブのステージ実行
pub mod probe;

/// ユースケース
pub mod usecase;

/// CLI 解析
pub mod cli;

/// 配線
pub mod wiring;
