//! アダプター（外界の I/O を trait で実装）
//!
//! usecase は ports::outbound の trait 経由でのみファイル・時刻・プロセス・ログに触れる。
//! ここは標準実装（Std*）と、ログ先が無いときの NoopLog を置く。

pub mod file_json_log;
pub mod std_clock;
pub mod std_fs;
pub mod std_process;

pub use file_json_log::{FileJsonLog, NoopLog};
pub use std_clock::{FixedClock, StdClock};
pub use std_fs::StdFileSystem;
pub use std_process::StdProcess;
