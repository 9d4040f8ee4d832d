//! Test deployment utilities shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use epochkv_client::{ClientConfig, ClientSession, ReplicaAddr};
use epochkv_transport_memory::MemoryCluster;

/// An in-process deployment: one memory cluster plus a session bound to it.
pub struct TestDeployment {
    pub cluster: MemoryCluster,
    pub nodes: Vec<ReplicaAddr>,
    pub session: ClientSession<MemoryCluster>,
}

impl TestDeployment {
    /// Build a deployment with `node_count` reachable replicas and a
    /// session seeded with the all-nodes configuration.
    pub fn new(node_count: usize) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("epochkv_client=debug,epochkv_transport_memory=debug")
            .try_init();

        let nodes: Vec<ReplicaAddr> = (0..node_count)
            .map(|i| ReplicaAddr::new(format!("127.0.0.1:{}", 7000 + i)))
            .collect();
        let cluster = MemoryCluster::new(&nodes);
        let session = ClientSession::new(
            Arc::new(cluster.clone()),
            nodes.clone(),
            ClientConfig::default(),
        )
        .expect("session over non-empty universe");

        Self {
            cluster,
            nodes,
            session,
        }
    }

    /// A second, independent session over the same cluster, with its own
    /// (initially all-nodes) configuration belief.
    pub fn stale_session(&self) -> ClientSession<MemoryCluster> {
        ClientSession::new(
            Arc::new(self.cluster.clone()),
            self.nodes.clone(),
            ClientConfig::default(),
        )
        .expect("session over non-empty universe")
    }
}
