//! フィクスチャの書き出し

use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use common::ports::outbound::FileSystem;

use crate::profile::{FixtureFile, LanguageProfile, ScenarioFixture};

/// 共通ファイルとシナリオのファイルを `root` の下に書き出す
pub fn materialize(
    fs: &dyn FileSystem,
    profile: &LanguageProfile,
    fixture: &ScenarioFixture,
    root: &Path,
) -> Result<()> {
    for file in profile.shared_files.iter().chain(fixture.files) {
        write_file(fs, root, file)?;
    }
    Ok(())
}

fn write_file(fs: &dyn FileSystem, root: &Path, file: &FixtureFile) -> Result<()> {
    let relative = Path::new(file.path);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        bail!("fixture path must stay inside the project: {}", file.path);
    }
    let dest = root.join(relative);
    if let Some(parent) = dest.parent() {
        fs.create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    fs.write(&dest, file.contents.as_bytes())
        .with_context(|| format!("write fixture {}", dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{profile, Scenario};
    use common::adapter::StdFileSystem;

    #[test]
    fn test_materialize_rust_passing() {
        let dir = tempfile::tempdir().unwrap();
        let rust = profile("rust").unwrap();
        let fixture = rust.fixture(Scenario::SinglePassing).unwrap();

        materialize(&StdFileSystem, &rust, fixture, dir.path()).unwrap();

        assert!(dir.path().join("Cargo.toml").is_file());
        let lib = std::fs::read_to_string(dir.path().join("src/lib.rs")).unwrap();
        assert!(lib.contains("assert_eq!(add(2, 3), 5)"));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = FixtureFile {
            path: "../outside.txt",
            contents: "",
        };
        assert!(write_file(&StdFileSystem, dir.path(), &file).is_err());
    }
}
