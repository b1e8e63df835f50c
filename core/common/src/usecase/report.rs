//! レポートユースケース（取り込み → 正規化 → 永続化 → パススルー）
//!
//! 1 回きり・単一スレッド。テストの失敗は `Ok` のまま `TestOutcome::Failed` として返し、
//! `Err` はアダプタ自身の失敗（I/O・永続化・ツールチェーン不在）だけに使う。

use crate::config::{resolve_data_dir, DataDir, EnvSnapshot};
use crate::domain::{InputMode, NormalizedReport, ReporterInvocation, StageHint, TestOutcome};
use crate::error::Error;
use crate::normalize;
use crate::ports::outbound::{
    Clock, FileSystem, Log, LogLevel, LogRecord, ProbeLayout, Process, ResultNormalizer,
    ToolchainProbe,
};
use crate::probe::run_probe;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::SpooledTempFile;

/// これを超える入力はメモリではなく一時ファイルに退避する
const SPOOL_IN_MEMORY: usize = 8 * 1024 * 1024;
/// 解析のためにメモリへ読み込む上限
pub const MAX_PARSE_BYTES: u64 = 64 * 1024 * 1024;
/// 上限超過時に rawDiagnostics に残す先頭部分
const OVERSIZE_HEAD_BYTES: u64 = 1024 * 1024;

/// 1 回の実行の要約（main のログ・テスト用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub outcome: TestOutcome,
    pub artifact_path: PathBuf,
    pub input_bytes: u64,
}

/// レポートのユースケース
pub struct ReportUseCase {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    process: Arc<dyn Process>,
    logger: Arc<dyn Log>,
    normalizer: Arc<dyn ResultNormalizer>,
    probe: Arc<dyn ToolchainProbe>,
    env: EnvSnapshot,
    parse_limit: u64,
}

impl ReportUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        process: Arc<dyn Process>,
        logger: Arc<dyn Log>,
        normalizer: Arc<dyn ResultNormalizer>,
        probe: Arc<dyn ToolchainProbe>,
        env: EnvSnapshot,
    ) -> Self {
        Self {
            fs,
            clock,
            process,
            logger,
            normalizer,
            probe,
            env,
            parse_limit: MAX_PARSE_BYTES,
        }
    }

    /// 解析上限を変える（テスト用）
    pub fn with_parse_limit(mut self, limit: u64) -> Self {
        self.parse_limit = limit;
        self
    }

    /// レポートを 1 回実行する
    ///
    /// パススルーが有効なら、正規化・永続化の成否にかかわらず取り込んだバイト列をそのまま `output` に書く。
    pub fn run(
        &self,
        invocation: &ReporterInvocation,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<ReportSummary, Error> {
        self.log(
            LogRecord::new(LogLevel::Info, "report started")
                .kind("lifecycle")
                .field("language", self.normalizer.language())
                .field("project_root", invocation.project_root.display().to_string())
                .field("passthrough", invocation.passthrough),
        );

        let data_dir = resolve_data_dir(
            Some(invocation.project_root.as_path()),
            &self.env,
            self.fs.as_ref(),
        )?;
        let (mut spool, input_bytes, hint) = self.capture(invocation, &data_dir, input)?;
        self.log(
            LogRecord::new(LogLevel::Info, "input captured")
                .kind("capture")
                .field("bytes", input_bytes),
        );

        let persisted = self
            .normalize_spool(&mut spool, input_bytes, hint)
            .and_then(|report| self.persist(&data_dir, report));

        let replayed = if invocation.passthrough {
            self.replay(&mut spool, output)
        } else {
            Ok(())
        };

        let outcome = persisted?;
        replayed?;

        let summary = ReportSummary {
            outcome,
            artifact_path: data_dir.test_results_path(),
            input_bytes,
        };
        self.log(
            LogRecord::new(LogLevel::Info, "report finished")
                .kind("lifecycle")
                .field("outcome", summary.outcome.as_str())
                .field("artifact", summary.artifact_path.display().to_string()),
        );
        Ok(summary)
    }

    fn capture(
        &self,
        invocation: &ReporterInvocation,
        data_dir: &DataDir,
        input: &mut dyn Read,
    ) -> Result<(SpooledTempFile, u64, StageHint), Error> {
        let mut spool = SpooledTempFile::new(SPOOL_IN_MEMORY);
        let (len, hint) = match invocation.mode {
            InputMode::Stdin { hint } => {
                let len = io::copy(input, &mut spool)
                    .map_err(|e| Error::io_msg(format!("Failed to read standard input: {}", e)))?;
                (len, hint)
            }
            InputMode::Probe {
                ref build_dir,
                timeout,
            } => {
                let build_dir = build_dir.clone().unwrap_or_else(|| default_build_dir(data_dir));
                self.fs.create_dir_all(&build_dir)?;
                let layout = ProbeLayout {
                    project_root: invocation.project_root.to_path_buf(),
                    build_dir,
                };
                let capture = run_probe(
                    self.process.as_ref(),
                    self.probe.as_ref(),
                    &layout,
                    timeout,
                    self.logger.as_ref(),
                )?;
                let bytes = capture.combined();
                spool
                    .write_all(&bytes)
                    .map_err(|e| Error::io_msg(format!("Failed to buffer probe output: {}", e)))?;
                (bytes.len() as u64, capture.hint)
            }
        };
        Ok((spool, len, hint))
    }

    fn normalize_spool(
        &self,
        spool: &mut SpooledTempFile,
        len: u64,
        hint: StageHint,
    ) -> Result<NormalizedReport, Error> {
        spool.seek(SeekFrom::Start(0))?;
        if len > self.parse_limit {
            let mut head = Vec::new();
            Read::by_ref(spool)
                .take(OVERSIZE_HEAD_BYTES.min(self.parse_limit))
                .read_to_end(&mut head)?;
            self.log(
                LogRecord::new(LogLevel::Warn, "input exceeds parse limit")
                    .kind("normalize")
                    .field("bytes", len)
                    .field("limit", self.parse_limit),
            );
            return Ok(normalize::oversized(&head, len, self.parse_limit));
        }

        let mut raw = Vec::with_capacity(len as usize);
        spool.read_to_end(&mut raw)?;
        let report = normalize::normalize(self.normalizer.as_ref(), &raw, hint);
        self.log(
            LogRecord::new(LogLevel::Info, "output normalized")
                .kind("normalize")
                .field("outcome", report.outcome().as_str())
                .field("cases", report.cases().len()),
        );
        Ok(report)
    }

    fn persist(&self, data_dir: &DataDir, report: NormalizedReport) -> Result<TestOutcome, Error> {
        let path = data_dir.test_results_path();
        let outcome = report.outcome();
        let results = report.into_results(self.clock.now_rfc3339());
        let json = results.to_json()?;

        self.fs
            .create_dir_all(data_dir.path())
            .and_then(|_| self.fs.write_atomic(&path, json.as_bytes()))
            .map_err(|e| {
                let err = Error::persist(&path, e.to_string());
                self.log(LogRecord::new(LogLevel::Error, err.to_string()).kind("error"));
                err
            })?;
        self.log(
            LogRecord::new(LogLevel::Info, "artifact written")
                .kind("persist")
                .field("path", path.display().to_string()),
        );
        Ok(outcome)
    }

    fn replay(&self, spool: &mut SpooledTempFile, output: &mut dyn Write) -> Result<(), Error> {
        let result = spool
            .seek(SeekFrom::Start(0))
            .and_then(|_| io::copy(spool, output))
            .and_then(|_| output.flush());
        match result {
            Ok(()) => Ok(()),
            // 読み手が先に閉じた（`| head` など）。渡す相手がいないだけなので失敗にしない
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                self.log(LogRecord::new(LogLevel::Warn, "passthrough reader closed").kind("capture"));
                Ok(())
            }
            Err(e) => Err(Error::io_msg(format!("Failed to write passthrough output: {}", e))),
        }
    }

    fn log(&self, record: LogRecord) {
        let _ = self.logger.log(&record.layer("usecase"));
    }
}

/// `--build-dir` 未指定時のビルドディレクトリ（`<dataDir>/../build`）
fn default_build_dir(data_dir: &DataDir) -> PathBuf {
    data_dir
        .path()
        .parent()
        .map(|p| p.join("build"))
        .unwrap_or_else(|| PathBuf::from("build"))
}
