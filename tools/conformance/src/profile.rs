//! 言語ごとの設定（レポーターのパッケージ名・プローブ・フィクスチャ）
//!
//! フィクスチャはバイナリに埋め込み、シナリオごとに一時ディレクトリへ書き出す。

use std::fmt;
use std::sync::Arc;

use common::domain::TestOutcome;
use common::ports::outbound::ToolchainProbe;
use tdd_guard_cpp::CmakeProbe;
use tdd_guard_rust::CargoProbe;

/// 正規のシナリオ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    SinglePassing,
    SingleFailing,
    SingleImportError,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::SinglePassing,
        Scenario::SingleFailing,
        Scenario::SingleImportError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::SinglePassing => "singlePassing",
            Scenario::SingleFailing => "singleFailing",
            Scenario::SingleImportError => "singleImportError",
        }
    }

    pub fn expected_outcome(&self) -> TestOutcome {
        match self {
            Scenario::SinglePassing => TestOutcome::Passed,
            Scenario::SingleFailing => TestOutcome::Failed,
            Scenario::SingleImportError => TestOutcome::ImportError,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 埋め込みのフィクスチャファイル（`path` はプロジェクトルートからの相対）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureFile {
    pub path: &'static str,
    pub contents: &'static str,
}

/// 1 シナリオ分のフィクスチャ
#[derive(Debug, Clone, Copy)]
pub struct ScenarioFixture {
    pub scenario: Scenario,
    pub files: &'static [FixtureFile],
    /// 結果に現れるはずのケース名（ImportError では None）
    pub expected_case: Option<&'static str>,
}

/// 言語プロファイル
#[derive(Clone)]
pub struct LanguageProfile {
    pub name: &'static str,
    /// `cargo build -p` に渡すパッケージ名
    pub package: &'static str,
    pub binary: &'static str,
    pub probe: Arc<dyn ToolchainProbe>,
    /// 全シナリオ共通のファイル（ビルド定義など）
    pub shared_files: &'static [FixtureFile],
    pub scenarios: &'static [ScenarioFixture],
}

impl fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("name", &self.name)
            .field("package", &self.package)
            .field("binary", &self.binary)
            .finish()
    }
}

impl LanguageProfile {
    pub fn fixture(&self, scenario: Scenario) -> Option<&ScenarioFixture> {
        self.scenarios.iter().find(|s| s.scenario == scenario)
    }
}

const CPP_SHARED: &[FixtureFile] = &[FixtureFile {
    path: "CMakeLists.txt",
    contents: include_str!("../fixtures/cpp/CMakeLists.txt"),
}];

const CPP_SCENARIOS: &[ScenarioFixture] = &[
    ScenarioFixture {
        scenario: Scenario::SinglePassing,
        files: &[FixtureFile {
            path: "src/test.cpp",
            contents: include_str!("../fixtures/cpp/passing/test.cpp"),
        }],
        expected_case: Some("Calculator/should add numbers correctly"),
    },
    ScenarioFixture {
        scenario: Scenario::SingleFailing,
        files: &[FixtureFile {
            path: "src/test.cpp",
            contents: include_str!("../fixtures/cpp/failing/test.cpp"),
        }],
        expected_case: Some("Calculator/should add numbers correctly"),
    },
    ScenarioFixture {
        scenario: Scenario::SingleImportError,
        files: &[FixtureFile {
            path: "src/test.cpp",
            contents: include_str!("../fixtures/cpp/import/test.cpp"),
        }],
        expected_case: None,
    },
];

const RUST_SHARED: &[FixtureFile] = &[FixtureFile {
    path: "Cargo.toml",
    contents: include_str!("../fixtures/rust/Cargo.toml.tmpl"),
}];

const RUST_SCENARIOS: &[ScenarioFixture] = &[
    ScenarioFixture {
        scenario: Scenario::SinglePassing,
        files: &[FixtureFile {
            path: "src/lib.rs",
            contents: include_str!("../fixtures/rust/passing/lib.rs"),
        }],
        expected_case: Some("tests::should_add_numbers_correctly"),
    },
    ScenarioFixture {
        scenario: Scenario::SingleFailing,
        files: &[FixtureFile {
            path: "src/lib.rs",
            contents: include_str!("../fixtures/rust/failing/lib.rs"),
        }],
        expected_case: Some("tests::should_add_numbers_correctly"),
    },
    ScenarioFixture {
        scenario: Scenario::SingleImportError,
        files: &[FixtureFile {
            path: "src/lib.rs",
            contents: include_str!("../fixtures/rust/import/lib.rs"),
        }],
        expected_case: None,
    },
];

/// 対応言語の名前（CLI の選択肢）
pub const LANGUAGES: [&str; 2] = ["cpp", "rust"];

/// 名前からプロファイルを引く
pub fn profile(name: &str) -> Option<LanguageProfile> {
    match name {
        "cpp" => Some(LanguageProfile {
            name: "cpp",
            package: "tdd-guard-cpp",
            binary: "tdd-guard-cpp",
            probe: Arc::new(CmakeProbe),
            shared_files: CPP_SHARED,
            scenarios: CPP_SCENARIOS,
        }),
        "rust" => Some(LanguageProfile {
            name: "rust",
            package: "tdd-guard-rust",
            binary: "tdd-guard-rust",
            probe: Arc::new(CargoProbe),
            shared_files: RUST_SHARED,
            scenarios: RUST_SCENARIOS,
        }),
        _ => None,
    }
}

/// 全言語のプロファイル
pub fn profiles() -> Vec<LanguageProfile> {
    LANGUAGES.iter().filter_map(|name| profile(name)).collect()
}
