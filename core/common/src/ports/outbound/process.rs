//! サブプロセス実行 Outbound ポート
//!
//! ツールチェーン（cmake / cargo / テストバイナリ）やレポーター本体の起動を trait で抽象化する。

use crate::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// 起動するコマンド
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// 標準入力に書き込むバイト列（None なら標準入力は閉じる）
    pub stdin: Option<Vec<u8>>,
    /// 経過時間の上限（None なら無制限）
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// ログ・エラーメッセージ用の 1 行表現
    pub fn display(&self) -> String {
        let mut s = self.program.display().to_string();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

/// 終了の仕方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// 終了コード（シグナル終了は 128 + signo）
    Exited(i32),
    /// 制限時間を超えたため kill した
    TimedOut,
}

/// 実行結果（stdout / stderr は全量）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitKind,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == ExitKind::Exited(0)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            ExitKind::Exited(code) => Some(code),
            ExitKind::TimedOut => None,
        }
    }
}

/// サブプロセス実行の抽象
///
/// 実装は `common::adapter::StdProcess`（std::process::Command）など。
/// プログラムが見つからない場合は `Error::ToolchainMissing` を返す。非 0 終了はエラーではない。
pub trait Process: Send + Sync {
    fn output(&self, spec: &CommandSpec) -> Result<ProcessOutput, Error>;
}
