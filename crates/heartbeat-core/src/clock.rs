//! Wall-clock sources for heartbeat timestamps.
//!
//! The emitter never reads the system clock directly. It asks a
//! [`Clock`], so tests can substitute a deterministic source.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, TimeDelta};
use tokio::time::Instant;

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    /// The current wall-clock time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}

/// The host's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A wall clock anchored at a fixed start time that advances with
/// tokio's monotonic clock.
///
/// Under `#[tokio::test(start_paused = true)]` it moves only when tokio's
/// paused time moves, which makes timestamps deterministic.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: DateTime<FixedOffset>,
    origin: Instant,
}

impl ManualClock {
    /// Anchor a new clock at `start`, measured from the current tokio instant.
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            start,
            origin: Instant::now(),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        TimeDelta::from_std(self.origin.elapsed())
            .ok()
            .and_then(|delta| self.start.checked_add_signed(delta))
            .unwrap_or(self.start)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn manual_clock_follows_tokio_time() {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), start + TimeDelta::seconds(90));
    }

    #[test]
    fn system_clock_is_close_to_utc_now() {
        let before = chrono::Utc::now();
        let now = SystemClock.now().with_timezone(&chrono::Utc);
        let after = chrono::Utc::now();
        assert!(now >= before && now <= after);
    }
}
