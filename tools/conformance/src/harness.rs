//! 適合性ハーネス本体
//!
//! 言語ごとにレポーターを 1 度だけビルドし、各シナリオを専用の一時ディレクトリで
//! 「フィクスチャ書き出し → プローブ → レポーターへパイプ → 判定」の順に回す。
//! 判定の不一致は `ScenarioReport` に残し、一時ディレクトリ作成やツールチェーン不在などの
//! ハーネス側の失敗は `anyhow::Error` で中断する。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use common::config::{resolve_data_dir, EnvSnapshot};
use common::domain::DEFAULT_STAGE_TIMEOUT;
use common::ports::outbound::{
    CommandSpec, FileSystem, Log, LogLevel, LogRecord, ProbeLayout, Process,
};
use common::probe::run_probe;

use crate::fixture::materialize;
use crate::profile::{LanguageProfile, Scenario};
use crate::report::{check_scenario, HarnessReport, ScenarioReport};

/// プローブが流したバイト列の控え（作業ディレクトリ直下）
pub const DEBUG_OUTPUT_FILE: &str = "debug-output.txt";
/// レポーターのビルド先（ワークスペースの target 配下）
pub const TARGET_SUBDIR: &str = "tdd-guard-conformance";

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    /// ワークスペースのルート（`cargo build -p` を実行する場所）
    pub workspace: PathBuf,
    /// ビルド済みレポーター。指定時はビルドしない（言語は 1 つに限る）
    pub reporter_bin: Option<PathBuf>,
    /// プローブの各ステージとレポーター実行の制限時間
    pub timeout: Duration,
    pub keep_temp: bool,
    pub sequential: bool,
}

impl HarnessOptions {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            reporter_bin: None,
            timeout: DEFAULT_STAGE_TIMEOUT,
            keep_temp: false,
            sequential: false,
        }
    }
}

pub struct Harness {
    process: Arc<dyn Process>,
    fs: Arc<dyn FileSystem>,
    logger: Arc<dyn Log>,
    options: HarnessOptions,
}

impl Harness {
    pub fn new(
        process: Arc<dyn Process>,
        fs: Arc<dyn FileSystem>,
        logger: Arc<dyn Log>,
        options: HarnessOptions,
    ) -> Self {
        Self {
            process,
            fs,
            logger,
            options,
        }
    }

    fn log(&self, record: LogRecord) {
        let _ = self.logger.log(&record.layer("harness"));
    }

    /// 全言語・全シナリオを回す
    pub fn run(&self, profiles: &[LanguageProfile]) -> Result<HarnessReport> {
        if self.options.reporter_bin.is_some() && profiles.len() != 1 {
            bail!("--reporter-bin needs exactly one --language");
        }

        let mut jobs: Vec<(&LanguageProfile, PathBuf, Scenario)> = Vec::new();
        for profile in profiles {
            let adapter = match &self.options.reporter_bin {
                Some(bin) => bin.clone(),
                None => self.build_adapter(profile)?,
            };
            for scenario in Scenario::ALL {
                jobs.push((profile, adapter.clone(), scenario));
            }
        }

        let results: Vec<Result<ScenarioReport>> = if self.options.sequential {
            jobs.iter()
                .map(|(profile, adapter, scenario)| self.run_scenario(profile, adapter, *scenario))
                .collect()
        } else {
            std::thread::scope(|scope| {
                let handles: Vec<_> = jobs
                    .iter()
                    .map(|(profile, adapter, scenario)| {
                        scope.spawn(move || self.run_scenario(profile, adapter, *scenario))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| {
                        h.join()
                            .unwrap_or_else(|_| Err(anyhow!("scenario thread panicked")))
                    })
                    .collect()
            })
        };

        let scenarios = results.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(HarnessReport { scenarios })
    }

    /// `cargo build -p <package> --bin <binary>` でレポーターをビルドし、実行ファイルのパスを返す
    pub fn build_adapter(&self, profile: &LanguageProfile) -> Result<PathBuf> {
        let target_dir = self.options.workspace.join("target").join(TARGET_SUBDIR);
        let spec = CommandSpec::new("cargo")
            .args(["build", "-p", profile.package, "--bin", profile.binary, "--target-dir"])
            .arg(target_dir.display().to_string())
            .cwd(&self.options.workspace)
            .env("CARGO_TERM_COLOR", "never")
            .timeout(self.options.timeout);
        self.log(
            LogRecord::new(LogLevel::Info, "building reporter")
                .kind("build")
                .field("language", profile.name)
                .field("command", spec.display()),
        );

        let output = self
            .process
            .output(&spec)
            .with_context(|| format!("failed to run '{}'", spec.display()))?;
        if !output.success() {
            bail!(
                "building {} failed ({:?}):\n{}",
                profile.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        let binary = target_dir
            .join("debug")
            .join(format!("{}{}", profile.binary, std::env::consts::EXE_SUFFIX));
        if !self.fs.exists(&binary) {
            bail!("cargo reported success but {} is missing", binary.display());
        }
        Ok(binary)
    }

    /// 1 シナリオを専用の一時ディレクトリで実行する
    pub fn run_scenario(
        &self,
        profile: &LanguageProfile,
        adapter: &Path,
        scenario: Scenario,
    ) -> Result<ScenarioReport> {
        let fixture = profile
            .fixture(scenario)
            .with_context(|| format!("{} has no fixture for {}", profile.name, scenario))?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("tdd-guard-{}-{}-", profile.name, scenario))
            .tempdir()
            .context("failed to create a scenario work dir")?;
        let root = self
            .fs
            .canonicalize(dir.path())
            .context("failed to resolve the scenario work dir")?;
        materialize(self.fs.as_ref(), profile, fixture, &root)?;

        let layout = ProbeLayout {
            project_root: root.clone(),
            build_dir: root.join("build"),
        };
        let capture = run_probe(
            self.process.as_ref(),
            profile.probe.as_ref(),
            &layout,
            self.options.timeout,
            self.logger.as_ref(),
        )
        .with_context(|| format!("{} probe failed in {}", profile.name, scenario))?;

        let stream = capture.combined();
        self.fs
            .write(&root.join(DEBUG_OUTPUT_FILE), &stream)
            .context("failed to write the debug output")?;

        let spec = CommandSpec::new(adapter)
            .arg("--project-root")
            .arg(root.display().to_string())
            .arg("--passthrough")
            .cwd(&root)
            .stdin(stream.clone())
            .timeout(self.options.timeout);
        let output = self
            .process
            .output(&spec)
            .with_context(|| format!("failed to run '{}'", spec.display()))?;

        let artifact_path = resolve_data_dir(Some(root.as_path()), &EnvSnapshot::default(), self.fs.as_ref())?
            .test_results_path();
        let artifact = self
            .fs
            .read_to_string(&artifact_path)
            .map_err(|e| format!("artifact {} unreadable: {}", artifact_path.display(), e));

        let (outcome, failures) = check_scenario(fixture, &stream, &output, artifact);
        self.log(
            LogRecord::new(
                if failures.is_empty() {
                    LogLevel::Info
                } else {
                    LogLevel::Warn
                },
                "scenario finished",
            )
            .kind("scenario")
            .field("language", profile.name)
            .field("scenario", scenario.as_str())
            .field("piped_bytes", stream.len())
            .field("failures", failures.len()),
        );

        let work_dir = if self.options.keep_temp {
            Some(dir.keep())
        } else {
            None
        };
        Ok(ScenarioReport {
            language: profile.name.to_string(),
            scenario: scenario.as_str().to_string(),
            outcome,
            failures,
            work_dir,
        })
    }
}
