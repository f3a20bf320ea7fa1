use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use scriptci::status::Clock;

/// Clock that advances one second on every reading, starting at
/// 2026-01-01T00:00:00Z.
#[derive(Debug, Default)]
pub struct StepClock {
    ticks: AtomicI64,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("valid epoch")
    }

    /// Timestamp of the n-th reading (0-based).
    pub fn at(n: i64) -> DateTime<Utc> {
        Self::epoch() + TimeDelta::seconds(n)
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.ticks.fetch_add(1, Ordering::SeqCst);
        Self::at(n)
    }
}
