use std::process;
use std::sync::Arc;

use anyhow::Result;
use common::adapter::{FileJsonLog, NoopLog, StdFileSystem, StdProcess};
use common::ports::outbound::{FileSystem, Log, LogLevel, LogRecord};
use tdd_guard_conformance::cli::{parse_args, print_completion, ParseOutcome, BIN_NAME};
use tdd_guard_conformance::harness::Harness;

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", BIN_NAME, e);
            2
        }
    };
    process::exit(exit_code);
}

fn run() -> Result<i32> {
    let config = match parse_args()? {
        ParseOutcome::Run(config) => config,
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(shell);
            return Ok(0);
        }
        ParseOutcome::Help(text) => {
            print!("{}", text);
            return Ok(0);
        }
    };

    let fs: Arc<dyn FileSystem> = Arc::new(StdFileSystem);
    let logger: Arc<dyn Log> = match &config.log_file {
        Some(path) => Arc::new(FileJsonLog::new(Arc::clone(&fs), path)),
        None => Arc::new(NoopLog),
    };
    let _ = logger.log(
        &LogRecord::new(LogLevel::Info, "conformance started")
            .layer("cli")
            .kind("lifecycle")
            .field(
                "languages",
                config.languages.iter().map(|p| p.name).collect::<Vec<_>>(),
            ),
    );

    let harness = Harness::new(
        Arc::new(StdProcess),
        fs,
        Arc::clone(&logger),
        config.options.clone(),
    );
    let report = harness.run(&config.languages)?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    let _ = logger.log(
        &LogRecord::new(LogLevel::Info, "conformance finished")
            .layer("cli")
            .kind("lifecycle")
            .field("all_passed", report.all_passed()),
    );
    Ok(if report.all_passed() { 0 } else { 1 })
}
