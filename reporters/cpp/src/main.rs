use std::io::{self, BufWriter};
use std::process;
use std::sync::Arc;

use common::adapter::StdFileSystem;
use common::cli::{parse_args, usage_line, ParseOutcome};
use common::config::EnvSnapshot;
use common::error::Error;
use common::ports::outbound::{LogLevel, LogRecord};
use common::wiring::wire_reporter;
use tdd_guard_cpp::{CmakeProbe, CppNormalizer};

const BIN_NAME: &str = "tdd-guard-cpp";
const ABOUT: &str = "Normalize GoogleTest/Catch2 output and C++ build diagnostics for TDD Guard";

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                eprintln!("{}", usage_line(BIN_NAME));
            }
            eprintln!("{}: {}", BIN_NAME, e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let invocation = match parse_args(BIN_NAME, ABOUT, &StdFileSystem)? {
        ParseOutcome::Invocation(invocation) => invocation,
        ParseOutcome::Help(text) => {
            print!("{}", text);
            return Ok(0);
        }
    };
    let env = EnvSnapshot::capture()?;
    let app = wire_reporter(
        Arc::new(CppNormalizer),
        Arc::new(CmakeProbe),
        env,
        invocation.log_file.as_deref(),
    );

    let stdin = io::stdin();
    let mut output = BufWriter::new(io::stdout().lock());
    let result = app.report.run(&invocation, &mut stdin.lock(), &mut output);
    if let Err(ref e) = result {
        let _ = app.logger.log(
            &LogRecord::new(LogLevel::Error, e.to_string())
                .layer("cli")
                .kind("error")
                .field("exit_code", e.exit_code()),
        );
    }
    result.map(|_| 0)
}
