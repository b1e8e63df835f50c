//! CLI 引数から一度だけ組み立てる起動パラメータ

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::capture::StageHint;

/// 各ステージの既定タイムアウト
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(600);

/// プロジェクトルート（絶対パス・実在・正規化済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot(PathBuf);

impl ProjectRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl std::ops::Deref for ProjectRoot {
    type Target = PathBuf;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for ProjectRoot {
    fn as_ref(&self) -> &Path {
        self.0.as_ref()
    }
}

/// 入力の取り込み方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// 標準入力を EOF まで読む
    Stdin { hint: StageHint },
    /// レポーター自身がプローブを走らせる（build_dir 未指定ならデータディレクトリの隣）
    Probe {
        build_dir: Option<PathBuf>,
        timeout: Duration,
    },
}

/// レポーターの起動パラメータ（プロセスの間は不変）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterInvocation {
    pub project_root: ProjectRoot,
    pub passthrough: bool,
    pub mode: InputMode,
    /// 構造化ログ（JSONL）の出力先
    pub log_file: Option<PathBuf>,
}
