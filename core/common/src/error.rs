//! エラーハンドリング
//!
//! レポーター（アダプタ）自身の成否だけを表す。テストの失敗は `TestOutcome` で表現し、
//! ここには現れない。終了コードは sysexits.h に合わせる。

use std::path::PathBuf;

use crate::config::ConfigError;

/// 引数不正
pub const EXIT_USAGE: i32 = 64;
/// ツールチェーンのバイナリが見つからない
pub const EXIT_UNAVAILABLE: i32 = 69;
/// 内部エラー
pub const EXIT_SOFTWARE: i32 = 70;
/// I/O・永続化の失敗
pub const EXIT_IOERR: i32 = 74;
/// 設定エラー
pub const EXIT_CONFIG: i32 = 78;

/// アダプタのエラー型（プロセス境界）
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("toolchain binary not found: {program}")]
    ToolchainMissing { program: String },
    #[error("{0}")]
    Io(String),
    #[error("failed to write test results to '{path}': {message}")]
    Persist { path: PathBuf, message: String },
    #[error("JSON error: {0}")]
    Json(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("environment error: {0}")]
    Env(String),
    #[error("{0}")]
    System(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn io_msg(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    pub fn env(msg: impl Into<String>) -> Self {
        Error::Env(msg.into())
    }

    pub fn system(msg: impl Into<String>) -> Self {
        Error::System(msg.into())
    }

    pub fn persist(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Error::Persist {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// 使い方を表示すべきエラーか
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// プロセスの終了コード
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => EXIT_USAGE,
            Error::ToolchainMissing { .. } => EXIT_UNAVAILABLE,
            Error::Io(_) | Error::Persist { .. } => EXIT_IOERR,
            Error::Config(_) | Error::Env(_) => EXIT_CONFIG,
            Error::Json(_) | Error::System(_) => EXIT_SOFTWARE,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
