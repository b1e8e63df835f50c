//! プローブのステージ実行（全言語共通）
//!
//! ステージは厳密に直列。configure / build が非 0 ならそこで止め、
//! それまでの stderr を蓄積して `BuildFailure` として返す。非 0 終了はデータであってエラーではない。
//! エラーになるのはツールチェーンのバイナリが無いときなど、インフラ側の失敗だけ。

use crate::domain::{RawCapture, StageHint, StageKind};
use crate::error::Error;
use crate::ports::outbound::{
    ExitKind, Log, LogLevel, LogRecord, ProbeLayout, Process, ToolchainProbe,
};
use std::time::Duration;

/// プローブを走らせて生出力を集める
pub fn run_probe<P, T>(
    process: &P,
    probe: &T,
    layout: &ProbeLayout,
    timeout: Duration,
    logger: &dyn Log,
) -> Result<RawCapture, Error>
where
    P: Process + ?Sized,
    T: ToolchainProbe + ?Sized,
{
    let mut stderr_acc: Vec<u8> = Vec::new();

    for stage in probe.stages(layout) {
        let spec = stage.command.clone().timeout(timeout);
        let _ = logger.log(
            &LogRecord::new(LogLevel::Info, "stage started")
                .layer("adapter")
                .kind("probe")
                .field("stage", stage.kind.as_str())
                .field("command", spec.display()),
        );
        let output = process.output(&spec)?;

        if output.status == ExitKind::TimedOut {
            let _ = logger.log(
                &LogRecord::new(LogLevel::Warn, "stage timed out")
                    .layer("adapter")
                    .kind("probe")
                    .field("stage", stage.kind.as_str())
                    .field("limit_secs", timeout.as_secs()),
            );
            append_section(&mut stderr_acc, &output.stderr);
            return Ok(RawCapture {
                stdout: output.stdout,
                stderr: stderr_acc,
                exit_code: None,
                hint: StageHint::TimedOut {
                    stage: stage.kind,
                    limit: timeout,
                },
            });
        }

        let exit_code = output.exit_code();
        let _ = logger.log(
            &LogRecord::new(LogLevel::Info, "stage finished")
                .layer("adapter")
                .kind("probe")
                .field("stage", stage.kind.as_str())
                .field("exit_code", exit_code),
        );

        if stage.kind == StageKind::Test {
            return Ok(RawCapture {
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code,
                hint: StageHint::TestRun,
            });
        }

        append_section(&mut stderr_acc, &output.stderr);
        if !output.success() {
            return Ok(RawCapture {
                stdout: output.stdout,
                stderr: stderr_acc,
                exit_code,
                hint: StageHint::BuildFailure,
            });
        }
    }

    Err(Error::system("toolchain probe defines no test stage"))
}

/// ステージ間を改行 1 つで区切って連結する
fn append_section(acc: &mut Vec<u8>, chunk: &[u8]) {
    if !acc.is_empty() && !acc.ends_with(b"\n") {
        acc.push(b'\n');
    }
    acc.extend_from_slice(chunk);
}
