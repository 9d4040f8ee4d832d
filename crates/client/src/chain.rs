//! Configuration-chain read protocol.
//!
//! Configurations form a forward chain: a superseded configuration, when
//! queried, points at its successor through the descriptors replicas attach
//! to read replies. The client has no out-of-band way to learn the current
//! configuration, so a read starts from the session's belief and hops
//! forward until no candidate reports a newer configuration.

use std::collections::BTreeMap;

use epochkv_transport::{ConfigDescriptor, QuorumTransport, Timestamp};
use tracing::{debug, warn};

use crate::parser::parse_membership;
use crate::session::ClientSession;

/// Result of a configuration-chain read.
///
/// A failed quorum call and an absent key are distinct outcomes:
/// [`Unavailable`](ReadOutcome::Unavailable) means no candidate
/// configuration produced a quorum-certified reply at all.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadOutcome {
    /// A quorum-certified value, the newest seen across all consulted
    /// configurations.
    Found {
        /// The winning value.
        value: String,
        /// Its write timestamp.
        timestamp: Timestamp,
    },
    /// At least one configuration replied, none of them stores the key.
    NotFound,
    /// Every candidate's quorum call failed or timed out.
    Unavailable,
}

impl ReadOutcome {
    /// The value, if one was found.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Found { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl<T: QuorumTransport> ClientSession<T> {
    /// Read the most up-to-date value for `key`, chasing the configuration
    /// chain and repairing the session's belief along the way.
    ///
    /// Candidates are consulted newest-first. Whenever a reply carries a
    /// descriptor strictly newer than the consulted candidate it joins the
    /// candidate set; if it is also started, it replaces the entire set and
    /// becomes the session's current configuration immediately, since a
    /// started successor makes every stale branch irrelevant.
    pub async fn read(&self, key: &str) -> ReadOutcome {
        let mut state = self.state.write().await;

        let mut candidates: BTreeMap<Timestamp, ConfigDescriptor> = BTreeMap::new();
        candidates.insert(state.descriptor.timestamp, state.descriptor.clone());

        let mut best: Option<(String, Timestamp)> = None;
        let mut certified = false;

        while let Some((consulted_at, candidate)) = candidates.pop_last() {
            let group = match parse_membership(&candidate.membership, &self.nodes) {
                Ok(group) => group,
                Err(err) => {
                    warn!(config = %candidate, %err, "skipping unresolvable candidate");
                    continue;
                }
            };

            let Ok(reply) = self.ops().read(&group, key).await else {
                continue;
            };
            certified = true;

            if reply.found
                && best
                    .as_ref()
                    .is_none_or(|(_, seen)| reply.timestamp > *seen)
            {
                best = Some((reply.value, reply.timestamp));
            }

            for discovered in reply.configs {
                if discovered.timestamp <= consulted_at {
                    continue;
                }
                if discovered.started {
                    match parse_membership(&discovered.membership, &self.nodes) {
                        Ok(group) => {
                            debug!(config = %discovered, "adopting newer started configuration");
                            state.descriptor = discovered.clone();
                            state.group = group;
                            candidates.clear();
                        }
                        Err(err) => {
                            warn!(config = %discovered, %err, "cannot adopt unresolvable configuration");
                        }
                    }
                }
                candidates.insert(discovered.timestamp, discovered);
            }
        }

        match best {
            Some((value, timestamp)) => ReadOutcome::Found { value, timestamp },
            None if certified => ReadOutcome::NotFound,
            None => ReadOutcome::Unavailable,
        }
    }
}
