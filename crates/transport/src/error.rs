//! Transport-level error types.

use std::time::Duration;

use thiserror::Error;

use crate::ReplicaAddr;

/// Errors surfaced by a quorum transport.
///
/// The coordination protocols recover from every variant locally: a failed
/// call yields "no result" for that call and the protocol continues.
#[derive(Clone, Debug, Error)]
pub enum TransportError {
    /// A group member could not be reached, so the full quorum cannot be
    /// assembled.
    #[error("replica {0} is unreachable")]
    Unreachable(ReplicaAddr),

    /// The call did not complete within its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The call targeted a group with no members.
    #[error("quorum group has no members")]
    EmptyGroup,

    /// The target replica is not part of the deployment.
    #[error("unknown replica {0}")]
    UnknownReplica(ReplicaAddr),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}
