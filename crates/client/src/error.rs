//! Error types for the coordination layer.

use epochkv_transport::TransportError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, Error>;

/// Errors reported to callers of the coordination layer.
///
/// Transport failures inside the read and reconfiguration protocols are
/// recovered locally (logged, call treated as unanswered); they only surface
/// as an `Error` from the direct operation wrappers.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range membership descriptor. Always aborts the
    /// operation with no partial effect.
    #[error("invalid membership descriptor '{descriptor}': {reason}")]
    InvalidDescriptor {
        /// The offending descriptor string.
        descriptor: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A session needs at least one replica address.
    #[error("no replica addresses provided")]
    NoReplicas,

    /// A diagnostic call named a node index outside the fixed universe.
    #[error("node index {index} out of range for {count} nodes")]
    NodeIndex {
        /// The requested index.
        index: usize,
        /// Number of nodes the session was started with.
        count: usize,
    },

    /// A direct operation's transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    pub(crate) fn invalid_descriptor(descriptor: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }
}
