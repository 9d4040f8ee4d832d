//! Quorum operation wrappers with fixed per-call deadlines.
//!
//! Every wrapper issues exactly one transport call, bounded by the session's
//! `rpc_timeout`. Failures are logged here and returned as errors; the
//! protocols treat an error strictly as "this call did not succeed", never
//! as "the value is absent from the store".

use std::future::Future;
use std::time::Duration;

use epochkv_transport::{
    ConfigDescriptor, NodeReadReply, QuorumGroup, QuorumTransport, ReadReply, ReplicaAddr,
    Timestamp, TransportError, WriteReply,
};
use tracing::warn;

pub(crate) struct Ops<'a, T> {
    transport: &'a T,
    deadline: Duration,
}

impl<'a, T: QuorumTransport> Ops<'a, T> {
    pub(crate) fn new(transport: &'a T, deadline: Duration) -> Self {
        Self {
            transport,
            deadline,
        }
    }

    async fn bounded<F, R>(&self, what: &str, call: F) -> Result<R, TransportError>
    where
        F: Future<Output = Result<R, TransportError>>,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(err)) => {
                warn!(%err, "{what} failed");
                Err(err)
            }
            Err(_) => {
                let err = TransportError::Timeout(self.deadline);
                warn!(deadline = ?self.deadline, "{what} timed out");
                Err(err)
            }
        }
    }

    pub(crate) async fn read(
        &self,
        group: &QuorumGroup,
        key: &str,
    ) -> Result<ReadReply, TransportError> {
        self.bounded("quorum read", self.transport.read(group, key))
            .await
    }

    pub(crate) async fn write(
        &self,
        group: &QuorumGroup,
        key: &str,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<WriteReply, TransportError> {
        self.bounded(
            "quorum write",
            self.transport.write(group, key, value, timestamp),
        )
        .await
    }

    pub(crate) async fn list_keys(
        &self,
        group: &QuorumGroup,
    ) -> Result<Vec<String>, TransportError> {
        self.bounded("quorum key listing", self.transport.list_keys(group))
            .await
    }

    pub(crate) async fn write_config(
        &self,
        group: &QuorumGroup,
        descriptor: &ConfigDescriptor,
    ) -> Result<(), TransportError> {
        self.bounded(
            "configuration announcement",
            self.transport.write_config(group, descriptor),
        )
        .await
    }

    pub(crate) async fn node_read(
        &self,
        replica: &ReplicaAddr,
        key: &str,
    ) -> Result<NodeReadReply, TransportError> {
        self.bounded("replica read", self.transport.node_read(replica, key))
            .await
    }

    pub(crate) async fn node_write(
        &self,
        replica: &ReplicaAddr,
        key: &str,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<WriteReply, TransportError> {
        self.bounded(
            "replica write",
            self.transport.node_write(replica, key, value, timestamp),
        )
        .await
    }

    pub(crate) async fn node_list_keys(
        &self,
        replica: &ReplicaAddr,
    ) -> Result<Vec<String>, TransportError> {
        self.bounded("replica key listing", self.transport.node_list_keys(replica))
            .await
    }
}
