//! Configuration descriptors exchanged between clients and replicas.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// One historical or current replica-group configuration.
///
/// Among all descriptors a client ever observes, the one with the latest
/// timestamp and `started == true` is authoritative. A descriptor with
/// `started == false` is an announced pending target: replicas surface it in
/// read replies so clients learn of the transition, but it is not yet safe
/// to treat as the source of truth.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConfigDescriptor {
    /// Membership descriptor string, range (`"0:3"`) or index-list
    /// (`"0,2,4"`) form, resolved against the client's fixed node universe.
    pub membership: String,
    /// True once the configuration has been activated and serves live
    /// traffic.
    pub started: bool,
    /// Logical creation time. Monotonically assigned at creation; the sole
    /// ordering key among configurations.
    pub timestamp: Timestamp,
}

impl ConfigDescriptor {
    /// A pending (not yet started) descriptor for the given membership.
    #[must_use]
    pub fn pending(membership: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            membership: membership.into(),
            started: false,
            timestamp,
        }
    }

    /// The same descriptor, marked as activated.
    #[must_use]
    pub fn activated(mut self) -> Self {
        self.started = true;
        self
    }

    /// Whether this descriptor supersedes `other`. Strictly-newer only: a
    /// descriptor never supersedes one with an equal timestamp, which is
    /// what keeps the discovery chain finite.
    #[must_use]
    pub fn supersedes(&self, other: &Self) -> bool {
        self.timestamp > other.timestamp
    }
}

impl fmt::Display for ConfigDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({})",
            self.membership,
            self.timestamp,
            if self.started { "started" } else { "pending" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supersedes_is_strict() {
        let older = ConfigDescriptor::pending("0:3", Timestamp::new(5, 0));
        let newer = ConfigDescriptor::pending("0:5", Timestamp::new(5, 1));
        assert!(newer.supersedes(&older));
        assert!(!older.supersedes(&newer));
        assert!(!older.supersedes(&older));
    }

    #[test]
    fn activation_preserves_identity() {
        let pending = ConfigDescriptor::pending("1,2", Timestamp::new(9, 9));
        let started = pending.clone().activated();
        assert!(started.started);
        assert_eq!(started.membership, pending.membership);
        assert_eq!(started.timestamp, pending.timestamp);
    }
}
