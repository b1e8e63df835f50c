//! CMake プローブ
//!
//! configure: `cmake -S <root> -B <build>` / build: `cmake --build <build>` /
//! test: `<build>/test_runner --reporter json`（Catch2 の JSON レポーター）。
//! 生成物はすべて build ディレクトリに置き、ソースツリーには書かない。

use common::domain::StageKind;
use common::ports::outbound::{CommandSpec, ProbeLayout, StageCommand, ToolchainProbe};

/// テスト実行ファイルの名前（CMakeLists.txt の add_executable と揃える）
pub const TEST_RUNNER: &str = "test_runner";

#[derive(Debug, Clone, Default)]
pub struct CmakeProbe;

impl ToolchainProbe for CmakeProbe {
    fn stages(&self, layout: &ProbeLayout) -> Vec<StageCommand> {
        let root = layout.project_root.display().to_string();
        let build = layout.build_dir.display().to_string();
        vec![
            StageCommand::new(
                StageKind::Configure,
                CommandSpec::new("cmake")
                    .args(["-S", root.as_str(), "-B", build.as_str()])
                    .cwd(&layout.project_root),
            ),
            StageCommand::new(
                StageKind::Build,
                CommandSpec::new("cmake")
                    .args(["--build", build.as_str()])
                    .cwd(&layout.project_root),
            ),
            StageCommand::new(
                StageKind::Test,
                CommandSpec::new(layout.build_dir.join(TEST_RUNNER))
                    .args(["--reporter", "json"])
                    .cwd(&layout.project_root),
            ),
        ]
    }
}
