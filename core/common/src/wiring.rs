//! 配線: 標準アダプタで ReportUseCase を組み立てる
//!
//! 言語ごとに違うのは正規化器とプローブだけ。それ以外（FS・時刻・プロセス・ログ）はここで共通に差し込む。

use std::path::Path;
use std::sync::Arc;

use crate::adapter::{FileJsonLog, NoopLog, StdClock, StdFileSystem, StdProcess};
use crate::config::EnvSnapshot;
use crate::ports::outbound::{FileSystem, Log, ResultNormalizer, ToolchainProbe};
use crate::usecase::ReportUseCase;

/// 組み立て済みのアプリケーション
pub struct App {
    pub report: ReportUseCase,
    /// main からのライフサイクル・エラーログ用
    pub logger: Arc<dyn Log>,
}

/// 配線: 標準アダプタでレポーターを組み立てる
///
/// ログ先は `--log-file` が優先、無ければ `TDD_GUARD_LOG_FILE`、どちらも無ければ出さない。
pub fn wire_reporter(
    normalizer: Arc<dyn ResultNormalizer>,
    probe: Arc<dyn ToolchainProbe>,
    env: EnvSnapshot,
    log_file: Option<&Path>,
) -> App {
    let fs: Arc<dyn FileSystem> = Arc::new(StdFileSystem);
    let logger: Arc<dyn Log> = match log_file.or(env.log_file.as_deref()) {
        Some(path) => Arc::new(FileJsonLog::new(Arc::clone(&fs), path)),
        None => Arc::new(NoopLog),
    };
    let report = ReportUseCase::new(
        Arc::clone(&fs),
        Arc::new(StdClock),
        Arc::new(StdProcess),
        Arc::clone(&logger),
        normalizer,
        probe,
        env,
    );
    App { report, logger }
}
