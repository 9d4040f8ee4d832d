//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`ClientSession`](crate::ClientSession).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deadline applied to every quorum and single-replica call. There is
    /// no retry below this deadline and no cancellation path above it.
    pub rpc_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_timeout: Duration::from_secs(1),
        }
    }
}
