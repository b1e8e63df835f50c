//! 標準サブプロセス実行（std::process::Command を委譲）
//!
//! stdout / stderr はスレッドで読み切る（パイプ詰まりで子が止まらないように）。
//! タイムアウト時は Unix ではプロセスグループごと SIGKILL する（cmake → make → cc のような孫も残さない）。

use crate::error::Error;
use crate::ports::outbound::{CommandSpec, ExitKind, Process, ProcessOutput};
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// 標準ライブラリの Command を使う Process 実装
#[derive(Debug, Clone, Default)]
pub struct StdProcess;

impl Process for StdProcess {
    fn output(&self, spec: &CommandSpec) -> Result<ProcessOutput, Error> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }
        #[cfg(unix)]
        if spec.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ToolchainMissing {
                    program: spec.program.display().to_string(),
                }
            } else {
                Error::io_msg(format!("Failed to execute '{}': {}", spec.display(), e))
            }
        })?;

        let stdin_writer = match (child.stdin.take(), spec.stdin.clone()) {
            (Some(mut pipe), Some(input)) => Some(thread::spawn(move || {
                // 子が先に終了して EPIPE になっても結果は子の出力で判断する
                let _ = pipe.write_all(&input);
            })),
            _ => None,
        };
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = match spec.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit)?,
            None => {
                let status = child.wait().map_err(|e| {
                    Error::io_msg(format!("Failed to wait for '{}': {}", spec.display(), e))
                })?;
                ExitKind::Exited(exit_code(status))
            }
        };

        if let Some(h) = stdin_writer {
            let _ = h.join();
        }
        Ok(ProcessOutput {
            stdout: join_reader(stdout_reader),
            stderr: join_reader(stderr_reader),
            status,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn wait_with_timeout(child: &mut Child, limit: Duration) -> Result<ExitKind, Error> {
    let started = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| Error::io_msg(format!("Failed to poll child process: {}", e)))?
        {
            return Ok(ExitKind::Exited(exit_code(status)));
        }
        if started.elapsed() >= limit {
            kill_tree(child);
            let _ = child.wait();
            return Ok(ExitKind::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // process_group(0) で起動しているので pgid == pid
    let pgid = child.id() as libc::pid_t;
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_captures_stdout_stderr_and_code() {
        let out = StdProcess
            .output(&sh("printf out; printf err >&2; exit 3"))
            .unwrap();
        assert_eq!(out.stdout, b"out");
        assert_eq!(out.stderr, b"err");
        assert_eq!(out.status, ExitKind::Exited(3));
        assert!(!out.success());
    }

    #[test]
    fn test_feeds_stdin() {
        let out = StdProcess
            .output(&CommandSpec::new("cat").stdin(b"a\x00b\r\nc".to_vec()))
            .unwrap();
        assert_eq!(out.stdout, b"a\x00b\r\nc");
        assert!(out.success());
    }

    #[test]
    fn test_missing_program_is_toolchain_missing() {
        let err = StdProcess
            .output(&CommandSpec::new("/nonexistent/tdd-guard-no-such-tool"))
            .unwrap_err();
        assert!(matches!(err, Error::ToolchainMissing { .. }));
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn test_timeout_kills_process() {
        let started = Instant::now();
        let out = StdProcess
            .output(&sh("echo started; sleep 30").timeout(Duration::from_millis(300)))
            .unwrap();
        assert_eq!(out.status, ExitKind::TimedOut);
        assert_eq!(out.exit_code(), None);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(out.stdout, b"started\n");
    }

    #[test]
    fn test_env_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let out = StdProcess
            .output(
                &sh("printf \"$TDD_GUARD_PROBE:\"; pwd")
                    .env("TDD_GUARD_PROBE", "x")
                    .cwd(dir.path()),
            )
            .unwrap();
        let text = String::from_utf8(out.stdout).unwrap();
        let canonical = std::fs::canonicalize(dir.path()).unwrap();
        assert!(text.starts_with("x:"));
        assert!(text.trim_end().ends_with(canonical.file_name().unwrap().to_str().unwrap()));
    }
}
