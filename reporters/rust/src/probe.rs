//! Cargo プローブ
//!
//! configure: `cargo metadata`（マニフェストの検証）/ build: `cargo test --no-run` /
//! test: libtest の JSON 形式で実行。生成物は `--target-dir` に閉じ込める。

use common::domain::StageKind;
use common::ports::outbound::{CommandSpec, ProbeLayout, StageCommand, ToolchainProbe};

/// `-Z unstable-options --format json` を stable の libtest で通すための変数
pub const RUSTC_BOOTSTRAP_VAR: &str = "RUSTC_BOOTSTRAP";

#[derive(Debug, Clone, Default)]
pub struct CargoProbe;

impl ToolchainProbe for CargoProbe {
    fn stages(&self, layout: &ProbeLayout) -> Vec<StageCommand> {
        let target_dir = layout.build_dir.display().to_string();
        let cargo = |args: &[&str]| {
            CommandSpec::new("cargo")
                .args(args.iter().copied())
                .cwd(&layout.project_root)
                .env("CARGO_TERM_COLOR", "never")
                // build と test で値が違うと再ビルドになるので両方に付ける
                .env(RUSTC_BOOTSTRAP_VAR, "1")
        };
        vec![
            StageCommand::new(
                StageKind::Configure,
                cargo(&["metadata", "--format-version", "1", "--no-deps"]),
            ),
            StageCommand::new(
                StageKind::Build,
                cargo(&["test", "--no-run", "--target-dir", target_dir.as_str()]),
            ),
            StageCommand::new(
                StageKind::Test,
                cargo(&[
                    "test",
                    "--target-dir",
                    target_dir.as_str(),
                    "--",
                    "-Z",
                    "unstable-options",
                    "--format",
                    "json",
                ]),
            ),
        ]
    }
}
