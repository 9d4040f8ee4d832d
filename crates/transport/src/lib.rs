//! Quorum transport abstraction for the replicated key-value store
//!
//! This crate provides the transport-agnostic seam between the client-side
//! coordination protocols and the replica fleet. A transport is handed a
//! resolved [`QuorumGroup`] and is responsible for:
//! - fanning the request out to every member of the group
//! - combining the individual replies under the group's quorum policy
//! - returning one logical, quorum-certified reply
//!
//! Connection management, retries, and fan-out concurrency belong to the
//! implementation. The coordination protocols issue calls one at a time and
//! treat any [`TransportError`] as "this call did not succeed", never as a
//! statement about stored data.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

mod descriptor;
mod timestamp;

pub use descriptor::ConfigDescriptor;
pub use error::TransportError;
pub use timestamp::Timestamp;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Network address of a single storage replica.
///
/// Addresses are opaque to the coordination layer: clients refer to replicas
/// by their ordinal position in the fixed node universe, and a membership
/// descriptor is resolved to addresses once, when a group is built.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplicaAddr(String);

impl ReplicaAddr {
    /// Create an address from anything string-like.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplicaAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReplicaAddr {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}

/// A resolved, callable replica group with its quorum-size policy.
///
/// The policy is deliberately a *full* quorum: every member must contribute
/// a reply for a call to be certified. This trades availability for the
/// simplest possible reconfiguration story (any single member has seen every
/// certified write) and is part of the public contract, not an
/// implementation detail.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct QuorumGroup {
    members: Vec<ReplicaAddr>,
    quorum_size: usize,
}

impl QuorumGroup {
    /// Build a group over the given members with a full-quorum policy.
    #[must_use]
    pub fn new(members: Vec<ReplicaAddr>) -> Self {
        let quorum_size = members.len();
        Self {
            members,
            quorum_size,
        }
    }

    /// Members of the group, in selection order.
    #[must_use]
    pub fn members(&self) -> &[ReplicaAddr] {
        &self.members
    }

    /// Number of replies required to certify a call.
    #[must_use]
    pub fn quorum_size(&self) -> usize {
        self.quorum_size
    }

    /// Number of members in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Display for QuorumGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        write!(f, "]")
    }
}

/// Quorum-certified reply to a read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadReply {
    /// Whether any certified value exists for the key.
    pub found: bool,
    /// The value, empty when `found` is false.
    pub value: String,
    /// Timestamp of the winning value, [`Timestamp::ZERO`] when not found.
    pub timestamp: Timestamp,
    /// Configurations the replying replicas know about. Advisory: the
    /// coordination layer uses these to discover successor configurations.
    pub configs: Vec<ConfigDescriptor>,
}

/// Quorum-certified reply to a write.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WriteReply {
    /// False when the quorum judged the supplied timestamp not newer than
    /// the stored value. A stale write is dropped silently, not an error.
    pub accepted: bool,
}

/// Reply to a direct single-replica read. Carries no attached
/// configurations; one replica's configuration claim is never trusted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeReadReply {
    /// Whether the replica stores a value for the key.
    pub found: bool,
    /// The stored value, empty when `found` is false.
    pub value: String,
    /// Timestamp of the stored value, [`Timestamp::ZERO`] when not found.
    pub timestamp: Timestamp,
}

/// Transport seam for quorum-certified and direct replica calls.
///
/// Implementations own all per-call concurrency and connection handling.
/// Every method is a single logical RPC from the caller's perspective.
#[async_trait]
pub trait QuorumTransport: Send + Sync + 'static {
    /// Read a key from every member of the group and combine the replies.
    async fn read(&self, group: &QuorumGroup, key: &str) -> Result<ReadReply, TransportError>;

    /// Write a timestamped value to every member of the group.
    async fn write(
        &self,
        group: &QuorumGroup,
        key: &str,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<WriteReply, TransportError>;

    /// List the union of keys stored by the group.
    async fn list_keys(&self, group: &QuorumGroup) -> Result<Vec<String>, TransportError>;

    /// Announce a configuration descriptor to every member of the group.
    async fn write_config(
        &self,
        group: &QuorumGroup,
        descriptor: &ConfigDescriptor,
    ) -> Result<(), TransportError>;

    /// Read a key from one named replica. Diagnostic, not quorum-certified.
    async fn node_read(
        &self,
        replica: &ReplicaAddr,
        key: &str,
    ) -> Result<NodeReadReply, TransportError>;

    /// Write a timestamped value to one named replica.
    async fn node_write(
        &self,
        replica: &ReplicaAddr,
        key: &str,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<WriteReply, TransportError>;

    /// List the keys stored by one named replica.
    async fn node_list_keys(&self, replica: &ReplicaAddr) -> Result<Vec<String>, TransportError>;
}
