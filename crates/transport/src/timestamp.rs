//! Wire timestamp used to order values and configurations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A wall-clock-derived logical timestamp with seconds/nanoseconds wire
/// shape.
///
/// Ordering is lexicographic over `(seconds, nanos)`, which matches
/// chronological order. The timestamp is the sole ordering key both among
/// values of one key (last-timestamp-wins) and among configurations.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second nanoseconds, always below one billion.
    pub nanos: u32,
}

impl Timestamp {
    /// The zero timestamp, older than every timestamp a clock can issue.
    pub const ZERO: Self = Self {
        seconds: 0,
        nanos: 0,
    };

    /// Create a timestamp from its wire components.
    #[must_use]
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Whether this is the zero timestamp.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanos == 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_chronological() {
        let early = Timestamp::new(10, 999_999_999);
        let later = Timestamp::new(11, 0);
        assert!(early < later);
        assert!(Timestamp::ZERO < early);
        assert!(Timestamp::new(11, 1) > later);
    }

    #[test]
    fn zero_is_zero() {
        assert!(Timestamp::ZERO.is_zero());
        assert!(!Timestamp::new(0, 1).is_zero());
    }
}
