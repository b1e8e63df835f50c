//! ユースケース

pub mod report;

pub use report::{ReportSummary, ReportUseCase, MAX_PARSE_BYTES};
