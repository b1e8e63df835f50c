//! Outbound ポート: レポーターが外界（FS・時刻・プロセス・ログ）と言語固有部分を使うための trait

pub mod clock;
pub mod fs;
pub mod log;
pub mod normalizer;
pub mod probe;
pub mod process;

pub use clock::Clock;
pub use fs::{FileMetadata, FileSystem};
pub use log::{now_iso8601, Log, LogLevel, LogRecord};
pub use normalizer::{ParseFailure, ResultNormalizer};
pub use probe::{ProbeLayout, StageCommand, ToolchainProbe};
pub use process::{CommandSpec, ExitKind, Process, ProcessOutput};
