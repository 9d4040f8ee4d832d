//! Client session: the handle callers operate through.

use std::sync::Arc;

use epochkv_transport::{
    ConfigDescriptor, NodeReadReply, QuorumGroup, QuorumTransport, ReadReply, ReplicaAddr,
    Timestamp, WriteReply,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::clock::WallClock;
use crate::config::ClientConfig;
use crate::error::{ClientResult, Error};
use crate::ops::Ops;
use crate::parser::parse_membership;

/// The session's belief about the authoritative configuration, together
/// with its resolved group handle.
///
/// Read-and-updated atomically: the read protocol and the reconfiguration
/// coordinator hold the write guard for their full duration, so concurrent
/// callers serialize instead of acting on a half-updated pair.
pub(crate) struct SessionState {
    pub(crate) descriptor: ConfigDescriptor,
    pub(crate) group: QuorumGroup,
}

/// A client session bound to a fixed universe of node addresses.
///
/// The session starts out believing the all-nodes configuration (zero
/// timestamp) is authoritative and repairs that belief through the
/// configuration-chain read protocol or by driving a reconfiguration
/// itself. The belief is never deleted, only superseded.
pub struct ClientSession<T: QuorumTransport> {
    pub(crate) transport: Arc<T>,
    /// The fixed, ordinal node universe membership descriptors resolve
    /// against.
    pub(crate) nodes: Vec<ReplicaAddr>,
    pub(crate) config: ClientConfig,
    pub(crate) clock: WallClock,
    pub(crate) state: RwLock<SessionState>,
}

impl<T: QuorumTransport> ClientSession<T> {
    /// Create a session over the given node universe.
    ///
    /// Fails with [`Error::NoReplicas`] when `nodes` is empty; this is the
    /// only fatal condition, everything after construction degrades to
    /// best-effort.
    pub fn new(transport: Arc<T>, nodes: Vec<ReplicaAddr>, config: ClientConfig) -> ClientResult<Self> {
        if nodes.is_empty() {
            return Err(Error::NoReplicas);
        }

        let membership = format!("0:{}", nodes.len());
        let group = parse_membership(&membership, &nodes)?;
        let descriptor = ConfigDescriptor {
            membership,
            started: true,
            timestamp: Timestamp::ZERO,
        };
        info!(config = %descriptor, "session created");

        Ok(Self {
            transport,
            nodes,
            config,
            clock: WallClock::new(),
            state: RwLock::new(SessionState { descriptor, group }),
        })
    }

    /// The node universe this session was started with.
    #[must_use]
    pub fn nodes(&self) -> &[ReplicaAddr] {
        &self.nodes
    }

    /// Snapshot of the configuration currently believed authoritative.
    pub async fn current_config(&self) -> ConfigDescriptor {
        self.state.read().await.descriptor.clone()
    }

    pub(crate) fn ops(&self) -> Ops<'_, T> {
        Ops::new(self.transport.as_ref(), self.config.rpc_timeout)
    }

    /// Quorum read against the current configuration only, without chasing
    /// the configuration chain. Attached configuration descriptors are
    /// passed through untouched.
    pub async fn read_current(&self, key: &str) -> ClientResult<ReadReply> {
        let state = self.state.read().await;
        Ok(self.ops().read(&state.group, key).await?)
    }

    /// Write a value under the current configuration with a fresh
    /// timestamp.
    ///
    /// `accepted == false` in the reply means the quorum judged the write
    /// stale; that is an outcome, not an error.
    pub async fn write(&self, key: &str, value: &str) -> ClientResult<WriteReply> {
        let state = self.state.read().await;
        let reply = self
            .ops()
            .write(&state.group, key, value, self.clock.now())
            .await?;
        Ok(reply)
    }

    /// List every key stored under the current configuration.
    pub async fn list_keys(&self) -> ClientResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(self.ops().list_keys(&state.group).await?)
    }

    /// Diagnostic read against one node of the universe, bypassing quorum
    /// certification.
    pub async fn node_read(&self, index: usize, key: &str) -> ClientResult<NodeReadReply> {
        let addr = self.node_addr(index)?;
        Ok(self.ops().node_read(addr, key).await?)
    }

    /// Diagnostic write against one node, with a fresh timestamp.
    pub async fn node_write(&self, index: usize, key: &str, value: &str) -> ClientResult<WriteReply> {
        let addr = self.node_addr(index)?;
        Ok(self
            .ops()
            .node_write(addr, key, value, self.clock.now())
            .await?)
    }

    /// Diagnostic key listing against one node.
    pub async fn node_list_keys(&self, index: usize) -> ClientResult<Vec<String>> {
        let addr = self.node_addr(index)?;
        Ok(self.ops().node_list_keys(addr).await?)
    }

    fn node_addr(&self, index: usize) -> ClientResult<&ReplicaAddr> {
        self.nodes.get(index).ok_or(Error::NodeIndex {
            index,
            count: self.nodes.len(),
        })
    }
}
