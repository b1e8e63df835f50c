//! 取り込んだ生出力（RawCapture）とステージのヒント

use std::time::Duration;

/// プローブのステージ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Configure,
    Build,
    Test,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Configure => "configure",
            StageKind::Build => "build",
            StageKind::Test => "test",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 正規化に渡すステージのヒント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageHint {
    /// 標準入力から受け取った。構造化ペイロードの有無で判断する。
    #[default]
    Auto,
    /// configure / build が非 0 で終わった
    BuildFailure,
    /// テスト実行まで進んだ
    TestRun,
    /// ステージが制限時間を超えた
    TimedOut { stage: StageKind, limit: Duration },
}

/// 1 回のプローブで得た生出力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// 最後に実行したステージの終了コード（タイムアウト時は None）
    pub exit_code: Option<i32>,
    pub hint: StageHint,
}

impl RawCapture {
    /// アダプタに流すバイト列
    ///
    /// テスト実行時は stdout の後ろに stderr、ビルド失敗時は蓄積した stderr。
    pub fn combined(&self) -> Vec<u8> {
        match self.hint {
            StageHint::BuildFailure => self.stderr.clone(),
            _ => {
                let mut out = Vec::with_capacity(self.stdout.len() + self.stderr.len());
                out.extend_from_slice(&self.stdout);
                out.extend_from_slice(&self.stderr);
                out
            }
        }
    }
}
