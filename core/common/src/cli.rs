//! レポーター共通の CLI 解析
//!
//! `tdd-guard-<lang> --project-root <abs> [--passthrough] [--stage auto|build|test]
//! [--run [--build-dir <dir>] [--timeout <secs>]] [--log-file <path>]`
//!
//! 引数は 1 度だけ解析して `ReporterInvocation` にし、以後は不変。

use crate::domain::{InputMode, ProjectRoot, ReporterInvocation, StageHint, DEFAULT_STAGE_TIMEOUT};
use crate::error::Error;
use crate::ports::outbound::FileSystem;
use clap::builder::ArgAction;
use clap::error::ErrorKind;
use clap::value_parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 解析結果: 通常の起動 / ヘルプ・バージョン表示
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Invocation(ReporterInvocation),
    /// 表示用テキスト（stdout に出して終了 0）
    Help(String),
}

fn build_clap_command(bin_name: &'static str, about: &'static str) -> clap::Command {
    clap::Command::new(bin_name)
        .about(about)
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            clap::Arg::new("project-root")
                .long("project-root")
                .value_name("path")
                .help("Absolute path of the project under test")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("passthrough")
                .long("passthrough")
                .help("Replay the captured output to stdout unchanged")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("stage")
                .long("stage")
                .value_name("stage")
                .help("What the piped output is: auto (detect), build (diagnostics), test (runner output)")
                .value_parser(["auto", "build", "test"])
                .default_value("auto")
                .conflicts_with("run")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("run")
                .long("run")
                .help("Run configure/build/test with the native toolchain instead of reading stdin")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("build-dir")
                .long("build-dir")
                .value_name("dir")
                .help("Build directory for --run (default: next to the data directory)")
                .value_parser(value_parser!(PathBuf))
                .requires("run")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("timeout")
                .long("timeout")
                .value_name("secs")
                .help("Wall-clock limit per stage for --run")
                .value_parser(value_parser!(u64).range(1..))
                .requires("run")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("log-file")
                .long("log-file")
                .value_name("path")
                .help("Append structured JSONL logs to this file (or set TDD_GUARD_LOG_FILE)")
                .value_parser(value_parser!(PathBuf))
                .num_args(1),
        )
}

fn matches_to_invocation(
    matches: &clap::ArgMatches,
    fs: &dyn FileSystem,
) -> Result<ReporterInvocation, Error> {
    let root = matches
        .get_one::<PathBuf>("project-root")
        .ok_or_else(|| Error::invalid_argument("--project-root is required"))?;
    let project_root = validate_project_root(fs, root)?;

    let mode = if matches.get_flag("run") {
        InputMode::Probe {
            build_dir: matches.get_one::<PathBuf>("build-dir").cloned(),
            timeout: matches
                .get_one::<u64>("timeout")
                .map(|s| Duration::from_secs(*s))
                .unwrap_or(DEFAULT_STAGE_TIMEOUT),
        }
    } else {
        let hint = match matches.get_one::<String>("stage").map(String::as_str) {
            Some("build") => StageHint::BuildFailure,
            Some("test") => StageHint::TestRun,
            _ => StageHint::Auto,
        };
        InputMode::Stdin { hint }
    };

    Ok(ReporterInvocation {
        project_root,
        passthrough: matches.get_flag("passthrough"),
        mode,
        log_file: matches.get_one::<PathBuf>("log-file").cloned(),
    })
}

/// 絶対パス・実在を確かめて正規化する
fn validate_project_root(fs: &dyn FileSystem, root: &Path) -> Result<ProjectRoot, Error> {
    if !root.is_absolute() {
        return Err(Error::invalid_argument(format!(
            "--project-root must be an absolute path: '{}'",
            root.display()
        )));
    }
    let is_dir = fs.metadata(root).map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(Error::invalid_argument(format!(
            "--project-root does not exist or is not a directory: '{}'",
            root.display()
        )));
    }
    let canonical = fs
        .canonicalize(root)
        .map_err(|e| Error::invalid_argument(e.to_string()))?;
    Ok(ProjectRoot::new(canonical))
}

fn clap_error(e: clap::Error) -> Result<ParseOutcome, Error> {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(ParseOutcome::Help(e.to_string())),
        _ => Err(Error::invalid_argument(e.to_string())),
    }
}

/// コマンドラインを解析する
pub fn parse_args(
    bin_name: &'static str,
    about: &'static str,
    fs: &dyn FileSystem,
) -> Result<ParseOutcome, Error> {
    match build_clap_command(bin_name, about).try_get_matches() {
        Ok(matches) => matches_to_invocation(&matches, fs).map(ParseOutcome::Invocation),
        Err(e) => clap_error(e),
    }
}

/// テスト用: 引数スライスから解析する
pub fn parse_args_from<I, T>(
    bin_name: &'static str,
    args: I,
    fs: &dyn FileSystem,
) -> Result<ParseOutcome, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match build_clap_command(bin_name, "").try_get_matches_from(args) {
        Ok(matches) => matches_to_invocation(&matches, fs).map(ParseOutcome::Invocation),
        Err(e) => clap_error(e),
    }
}

/// 使い方の 1 行（引数エラー時に stderr へ）
pub fn usage_line(bin_name: &str) -> String {
    format!(
        "Usage: {} --project-root <path> [--passthrough] [--stage auto|build|test] [--run [--build-dir <dir>] [--timeout <secs>]] [--log-file <path>]",
        bin_name
    )
}
