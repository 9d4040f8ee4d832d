//! Monotonic wall-clock timestamp source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use epochkv_transport::Timestamp;

/// Issues wall-clock-derived [`Timestamp`]s that are strictly increasing
/// across calls, even when the system clock stalls or steps backwards.
///
/// The last issued instant is kept in an atomic nanosecond counter; each
/// call takes the maximum of the current wall clock and one nanosecond past
/// the previous issue.
#[derive(Debug, Default)]
pub struct WallClock {
    last_nanos: AtomicU64,
}

impl WallClock {
    /// Create a clock with no issued timestamps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The next timestamp, strictly newer than every previous one.
    pub fn now(&self) -> Timestamp {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos() as u64);

        let mut issued = wall;
        let _ = self
            .last_nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = wall.max(last + 1);
                Some(issued)
            });

        Timestamp::new((issued / 1_000_000_000) as i64, (issued % 1_000_000_000) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_strictly_increase() {
        let clock = WallClock::new();
        let mut previous = Timestamp::ZERO;
        for _ in 0..10_000 {
            let next = clock.now();
            assert!(next > previous);
            previous = next;
        }
    }
}
