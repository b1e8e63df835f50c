//! ハーネスのコマンドライン

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::config::LOG_FILE_VAR;

use crate::harness::HarnessOptions;
use crate::profile::{profile, LanguageProfile, LANGUAGES};

pub const BIN_NAME: &str = "tdd-guard-conformance";

/// ソースツリー内で実行したときのワークスペース
const DEFAULT_WORKSPACE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../..");

#[derive(Debug, Clone)]
pub struct Config {
    pub languages: Vec<LanguageProfile>,
    pub options: HarnessOptions,
    pub log_file: Option<PathBuf>,
    /// 結果を JSON で出す
    pub json: bool,
}

#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Run(Config),
    GenerateCompletion(Shell),
    Help(String),
}

pub fn build_clap_command() -> clap::Command {
    clap::Command::new(BIN_NAME)
        .about("Run the TDD Guard reporters through the canonical conformance scenarios")
        .arg(
            clap::Arg::new("language")
                .short('l')
                .long("language")
                .value_name("name")
                .help("Language to check (repeatable; default: all)")
                .value_parser(LANGUAGES)
                .action(ArgAction::Append),
        )
        .arg(
            clap::Arg::new("reporter-bin")
                .long("reporter-bin")
                .value_name("path")
                .help("Use a prebuilt reporter instead of building it (one language only)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            clap::Arg::new("workspace")
                .long("workspace")
                .value_name("dir")
                .help("Cargo workspace that contains the reporters")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_WORKSPACE),
        )
        .arg(
            clap::Arg::new("timeout")
                .long("timeout")
                .value_name("secs")
                .help("Time limit for each probe stage and reporter run")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("600"),
        )
        .arg(
            clap::Arg::new("keep-temp")
                .long("keep-temp")
                .help("Keep each scenario's work dir")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("sequential")
                .long("sequential")
                .help("Run scenarios one at a time")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("json")
                .long("json")
                .help("Print the report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("log-file")
                .long("log-file")
                .value_name("path")
                .help("Append JSON log lines to this file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("shell")
                .help("Generate shell completion script")
                .value_parser(value_parser!(Shell)),
        )
}

fn matches_to_config(matches: &clap::ArgMatches) -> Result<Config> {
    let names: Vec<String> = matches
        .get_many::<String>("language")
        .map(|v| v.cloned().collect())
        .unwrap_or_else(|| LANGUAGES.iter().map(|s| s.to_string()).collect());
    let mut languages = Vec::new();
    for name in &names {
        if languages.iter().any(|p: &LanguageProfile| p.name == name.as_str()) {
            continue;
        }
        match profile(name) {
            Some(p) => languages.push(p),
            None => bail!("unknown language: {}", name),
        }
    }

    let reporter_bin = matches.get_one::<PathBuf>("reporter-bin").cloned();
    if reporter_bin.is_some() && languages.len() != 1 {
        bail!("--reporter-bin needs exactly one --language");
    }

    let mut options = HarnessOptions::new(
        matches
            .get_one::<PathBuf>("workspace")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE)),
    );
    options.reporter_bin = reporter_bin;
    if let Some(&secs) = matches.get_one::<u64>("timeout") {
        options.timeout = Duration::from_secs(secs);
    }
    options.keep_temp = matches.get_flag("keep-temp");
    options.sequential = matches.get_flag("sequential");

    let log_file = matches
        .get_one::<PathBuf>("log-file")
        .cloned()
        .or_else(|| std::env::var_os(LOG_FILE_VAR).map(PathBuf::from));

    Ok(Config {
        languages,
        options,
        log_file,
        json: matches.get_flag("json"),
    })
}

/// 引数を解析する（先頭はプログラム名）
pub fn parse_args_from<I, T>(args: I) -> Result<ParseOutcome>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = match build_clap_command().try_get_matches_from(args) {
        Ok(m) => m,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                return Ok(ParseOutcome::Help(e.to_string()))
            }
            _ => bail!("{}", e.to_string().trim_end()),
        },
    };
    if let Some(&shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(shell));
    }
    Ok(ParseOutcome::Run(matches_to_config(&matches)?))
}

pub fn parse_args() -> Result<ParseOutcome> {
    parse_args_from(std::env::args_os())
}

/// 補完スクリプトを標準出力に出す
pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut std::io::stdout());
}
