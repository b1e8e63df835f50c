//! データディレクトリの解決（test.json の置き場所）
//!
//! 環境変数・カレントディレクトリは `EnvSnapshot` として main で 1 度だけ取り込み、
//! 解決は `resolve_data_dir` の純粋な関数で行う。
//!
//! 優先順位:
//! 1. 明示されたプロジェクトルート（`<root>/.codex/config.toml` があれば Codex 側）
//! 2. CLAUDE_PROJECT_DIR（絶対パス・`..` なし・cwd を含むこと）
//! 3. CODEX_PROJECT_DIR（同上）、なければ cwd から上に `.codex/config.toml` を探す
//! 4. 相対の既定値 `.claude/tdd-guard/data`

use crate::ports::outbound::FileSystem;
use std::path::{Component, Path, PathBuf};

pub const TEST_RESULTS_FILENAME: &str = "test.json";
pub const CLAUDE_PROJECT_DIR_VAR: &str = "CLAUDE_PROJECT_DIR";
pub const CODEX_PROJECT_DIR_VAR: &str = "CODEX_PROJECT_DIR";
pub const LOG_FILE_VAR: &str = "TDD_GUARD_LOG_FILE";

const CLAUDE_DATA_DIR: [&str; 3] = [".claude", "tdd-guard", "data"];
const CODEX_DATA_DIR: [&str; 3] = [".codex", "tdd-guard", "data"];

/// データディレクトリ解決のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be an absolute path")]
    NotAbsolute { var: &'static str },
    #[error("{var} must not contain path traversal")]
    PathTraversal { var: &'static str },
    #[error("{var} must contain the current working directory")]
    CwdOutside { var: &'static str },
}

/// 解決に使う環境のスナップショット（テストでは直接組み立てる）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub claude_project_dir: Option<String>,
    pub codex_project_dir: Option<String>,
    pub log_file: Option<PathBuf>,
    pub cwd: PathBuf,
}

impl EnvSnapshot {
    /// プロセス環境から取り込む（ここ以外で std::env を読まない）
    pub fn capture() -> Result<Self, crate::error::Error> {
        let var = |key: &str| std::env::var(key).ok().filter(|s| !s.is_empty());
        let cwd = std::env::current_dir().map_err(|e| {
            crate::error::Error::env(format!("cannot determine current directory: {}", e))
        })?;
        Ok(Self {
            claude_project_dir: var(CLAUDE_PROJECT_DIR_VAR),
            codex_project_dir: var(CODEX_PROJECT_DIR_VAR),
            log_file: var(LOG_FILE_VAR).map(PathBuf::from),
            cwd,
        })
    }
}

/// どのエージェント向けのレイアウトか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirLayout {
    Claude,
    Codex,
}

impl DataDirLayout {
    fn suffix(&self) -> PathBuf {
        let parts = match self {
            DataDirLayout::Claude => CLAUDE_DATA_DIR,
            DataDirLayout::Codex => CODEX_DATA_DIR,
        };
        parts.iter().collect()
    }
}

/// 解決済みのデータディレクトリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    path: PathBuf,
    layout: DataDirLayout,
}

impl DataDir {
    fn under(base: &Path, layout: DataDirLayout) -> Self {
        Self {
            path: base.join(layout.suffix()),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> DataDirLayout {
        self.layout
    }

    /// `<dataDir>/test.json`
    pub fn test_results_path(&self) -> PathBuf {
        self.path.join(TEST_RESULTS_FILENAME)
    }
}

/// データディレクトリを解決する
pub fn resolve_data_dir<F: FileSystem + ?Sized>(
    project_root: Option<&Path>,
    env: &EnvSnapshot,
    fs: &F,
) -> Result<DataDir, ConfigError> {
    if let Some(root) = project_root {
        let layout = if has_codex_config(fs, root) {
            DataDirLayout::Codex
        } else {
            DataDirLayout::Claude
        };
        return Ok(DataDir::under(root, layout));
    }

    if let Some(dir) = validated_project_dir(
        CLAUDE_PROJECT_DIR_VAR,
        env.claude_project_dir.as_deref(),
        &env.cwd,
    )? {
        return Ok(DataDir::under(&dir, DataDirLayout::Claude));
    }

    let codex_root = match validated_project_dir(
        CODEX_PROJECT_DIR_VAR,
        env.codex_project_dir.as_deref(),
        &env.cwd,
    )? {
        Some(dir) => Some(dir),
        None => find_codex_config_root(fs, &env.cwd),
    };
    if let Some(dir) = codex_root {
        return Ok(DataDir::under(&dir, DataDirLayout::Codex));
    }

    Ok(DataDir::under(Path::new(""), DataDirLayout::Claude))
}

fn has_codex_config<F: FileSystem + ?Sized>(fs: &F, root: &Path) -> bool {
    fs.exists(&root.join(".codex").join("config.toml"))
}

fn validated_project_dir(
    var: &'static str,
    value: Option<&str>,
    cwd: &Path,
) -> Result<Option<PathBuf>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let dir = PathBuf::from(value);
    if !dir.is_absolute() {
        return Err(ConfigError::NotAbsolute { var });
    }
    if dir.components().any(|c| c == Component::ParentDir) {
        return Err(ConfigError::PathTraversal { var });
    }
    if !cwd.starts_with(&dir) {
        return Err(ConfigError::CwdOutside { var });
    }
    Ok(Some(dir))
}

fn find_codex_config_root<F: FileSystem + ?Sized>(fs: &F, cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| has_codex_config(fs, dir))
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StdFileSystem;

    fn env_with_cwd(cwd: &Path) -> EnvSnapshot {
        EnvSnapshot {
            cwd: cwd.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_root_uses_claude_layout() {
        let dir = tempfile::tempdir().unwrap();
        let data = resolve_data_dir(Some(dir.path()), &env_with_cwd(dir.path()), &StdFileSystem)
            .unwrap();
        assert_eq!(data.layout(), DataDirLayout::Claude);
        assert_eq!(
            data.test_results_path(),
            dir.path().join(".claude/tdd-guard/data/test.json")
        );
    }

    #[test]
    fn test_explicit_root_with_codex_config_uses_codex_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".codex")).unwrap();
        std::fs::write(dir.path().join(".codex/config.toml"), "dummy = true\n").unwrap();

        let data = resolve_data_dir(Some(dir.path()), &env_with_cwd(dir.path()), &StdFileSystem)
            .unwrap();
        assert_eq!(data.layout(), DataDirLayout::Codex);
        assert_eq!(data.path(), dir.path().join(".codex/tdd-guard/data"));
    }

    #[test]
    fn test_explicit_root_wins_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvSnapshot {
            claude_project_dir: Some("relative/is/ignored".to_string()),
            ..env_with_cwd(dir.path())
        };
        assert!(resolve_data_dir(Some(dir.path()), &env, &StdFileSystem).is_ok());
    }

    #[test]
    fn test_claude_project_dir_from_env() {
        let env = EnvSnapshot {
            claude_project_dir: Some("/work/project".to_string()),
            cwd: PathBuf::from("/work/project/src"),
            ..Default::default()
        };
        let data = resolve_data_dir(None, &env, &StdFileSystem).unwrap();
        assert_eq!(data.path(), Path::new("/work/project/.claude/tdd-guard/data"));
    }

    #[test]
    fn test_claude_project_dir_validation() {
        let cases = [
            ("work/project", ConfigError::NotAbsolute { var: CLAUDE_PROJECT_DIR_VAR }),
            ("/work/../etc", ConfigError::PathTraversal { var: CLAUDE_PROJECT_DIR_VAR }),
            ("/elsewhere", ConfigError::CwdOutside { var: CLAUDE_PROJECT_DIR_VAR }),
        ];
        for (value, expected) in cases {
            let env = EnvSnapshot {
                claude_project_dir: Some(value.to_string()),
                cwd: PathBuf::from("/work/project"),
                ..Default::default()
            };
            assert_eq!(resolve_data_dir(None, &env, &StdFileSystem).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_cwd_prefix_is_component_wise() {
        let env = EnvSnapshot {
            claude_project_dir: Some("/work/pro".to_string()),
            cwd: PathBuf::from("/work/project"),
            ..Default::default()
        };
        assert!(matches!(
            resolve_data_dir(None, &env, &StdFileSystem),
            Err(ConfigError::CwdOutside { .. })
        ));
    }

    #[test]
    fn test_codex_project_dir_from_env() {
        let env = EnvSnapshot {
            codex_project_dir: Some("/codex/project".to_string()),
            cwd: PathBuf::from("/codex/project/src"),
            ..Default::default()
        };
        let data = resolve_data_dir(None, &env, &StdFileSystem).unwrap();
        assert_eq!(data.layout(), DataDirLayout::Codex);
        assert_eq!(data.path(), Path::new("/codex/project/.codex/tdd-guard/data"));
    }

    #[test]
    fn test_discovers_codex_config_root_from_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        std::fs::create_dir_all(root.join(".codex")).unwrap();
        std::fs::create_dir_all(root.join("src/deep")).unwrap();
        std::fs::write(root.join(".codex/config.toml"), "").unwrap();

        let data = resolve_data_dir(None, &env_with_cwd(&root.join("src/deep")), &StdFileSystem)
            .unwrap();
        assert_eq!(data.path(), root.join(".codex/tdd-guard/data"));
    }

    #[test]
    fn test_default_is_relative() {
        let dir = tempfile::tempdir().unwrap();
        let data = resolve_data_dir(None, &env_with_cwd(dir.path()), &StdFileSystem).unwrap();
        assert_eq!(data.path(), Path::new(".claude/tdd-guard/data"));
        assert_eq!(data.layout(), DataDirLayout::Claude);
    }
}
