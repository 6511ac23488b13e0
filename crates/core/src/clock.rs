//! Time source for staleness checks.

/// Nanosecond clock used to stamp and compare refresh times.
pub trait Clock: Send + Sync {
    fn now_nanos(&self) -> i64;
}

/// Wall clock in nanoseconds since the Unix epoch.
///
/// Survives process restarts, unlike a monotonic instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}
