//! 時刻取得 Outbound ポート
//!
//! アーティファクトのタイムスタンプはこの trait 経由で取る。正規化そのものは時刻に依存しない。

/// 時刻取得の抽象
///
/// 実装は `common::adapter::StdClock` やテスト用の固定時刻など。
pub trait Clock: Send + Sync {
    /// 現在時刻をミリ秒（Unix epoch）で返す
    fn now_ms(&self) -> u64;

    /// 現在時刻を RFC3339 (UTC) で返す
    fn now_rfc3339(&self) -> String {
        let ms = self.now_ms() as i64;
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
            .unwrap_or_default()
            .to_rfc3339()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_now_rfc3339_is_utc() {
        let clock = FixedClock(1_767_225_600_000);
        assert_eq!(clock.now_rfc3339(), "2026-01-01T00:00:00+00:00");
    }
}
