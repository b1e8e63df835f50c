//! ツールチェーン・プローブ Outbound ポート（言語ごとに 1 実装）
//!
//! configure → build → test の各ステージのコマンドを組み立てるだけ。
//! 実行・打ち切り・出力の蓄積は `common::probe::run_probe` が共通で行う。

use crate::domain::StageKind;
use crate::ports::outbound::CommandSpec;
use std::path::PathBuf;

/// プローブが触ってよい場所
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeLayout {
    /// 対象プロジェクト（書き換えない）
    pub project_root: PathBuf,
    /// 生成物を置くディレクトリ
    pub build_dir: PathBuf,
}

/// 1 ステージ分のコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub kind: StageKind,
    pub command: CommandSpec,
}

impl StageCommand {
    pub fn new(kind: StageKind, command: CommandSpec) -> Self {
        Self { kind, command }
    }
}

/// 言語ごとのプローブ
pub trait ToolchainProbe: Send + Sync {
    /// ステージを実行順に返す。最後は `StageKind::Test` であること。
    fn stages(&self, layout: &ProbeLayout) -> Vec<StageCommand>;
}
