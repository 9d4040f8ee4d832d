//! Configuration-chain read protocol tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use epochkv_client::{
    ClientConfig, ClientSession, ConfigDescriptor, NodeReadReply, QuorumGroup, QuorumTransport,
    ReadOutcome, ReadReply, ReplicaAddr, Timestamp, TransportError, WriteReply,
};

mod common;
use common::TestDeployment;

#[tokio::test]
async fn missing_key_is_not_found_not_unavailable() {
    let deployment = TestDeployment::new(3);
    assert_eq!(deployment.session.read("nope").await, ReadOutcome::NotFound);
}

#[tokio::test]
async fn read_returns_quorum_certified_value() {
    let deployment = TestDeployment::new(3);
    let write = deployment.session.write("a", "1").await.unwrap();
    assert!(write.accepted);

    match deployment.session.read("a").await {
        ReadOutcome::Found { value, timestamp } => {
            assert_eq!(value, "1");
            assert!(timestamp > Timestamp::ZERO);
        }
        other => panic!("expected value, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_member_makes_read_unavailable() {
    let deployment = TestDeployment::new(3);
    deployment.session.write("a", "1").await.unwrap();
    deployment
        .cluster
        .set_reachable(&deployment.nodes[1], false)
        .await;

    assert_eq!(deployment.session.read("a").await, ReadOutcome::Unavailable);

    // The failed read must not disturb the session's belief.
    let config = deployment.session.current_config().await;
    assert_eq!(config.membership, "0:3");
    assert_eq!(config.timestamp, Timestamp::ZERO);
}

#[tokio::test]
async fn stale_session_chases_chain_and_adopts_started_config() {
    let deployment = TestDeployment::new(5);
    deployment.session.write("a", "1").await.unwrap();

    // A second client still believes the all-nodes configuration.
    let stale = deployment.stale_session();

    let report = deployment.session.reconf("0:3").await.unwrap();
    assert!(report.is_complete());

    // The stale client's read hops from "0:5" to the started "0:3"
    // configuration and returns the migrated value.
    match stale.read("a").await {
        ReadOutcome::Found { value, .. } => assert_eq!(value, "1"),
        other => panic!("expected value, got {other:?}"),
    }

    let adopted = stale.current_config().await;
    assert_eq!(adopted.membership, "0:3");
    assert!(adopted.started);
    assert_eq!(adopted.timestamp, report.target.timestamp);
}

#[tokio::test]
async fn pending_announcement_alone_is_not_adopted() {
    let deployment = TestDeployment::new(4);
    deployment.session.write("a", "1").await.unwrap();

    // An announced-but-never-activated configuration reaches the replicas.
    let pending = ConfigDescriptor::pending("0:2", Timestamp::new(100, 0));
    for addr in &deployment.nodes {
        deployment.cluster.seed_config(addr, pending.clone()).await;
    }

    // The read consults the pending candidate too, but the session must
    // keep treating the all-nodes configuration as authoritative.
    assert_eq!(
        deployment.session.read("a").await.value(),
        Some("1"),
        "value stays readable while a transition is pending"
    );
    let config = deployment.session.current_config().await;
    assert_eq!(config.membership, "0:4");
    assert_eq!(config.timestamp, Timestamp::ZERO);
}

#[tokio::test]
async fn chain_survives_descriptor_with_bad_membership() {
    let deployment = TestDeployment::new(3);
    deployment.session.write("a", "1").await.unwrap();

    // A corrupt announcement must be skipped, not break the read.
    let broken = ConfigDescriptor {
        membership: "0-99".to_string(),
        started: true,
        timestamp: Timestamp::new(50, 0),
    };
    for addr in &deployment.nodes {
        deployment.cluster.seed_config(addr, broken.clone()).await;
    }

    assert_eq!(deployment.session.read("a").await.value(), Some("1"));
    assert_eq!(
        deployment.session.current_config().await.membership,
        "0:3",
        "unresolvable configuration is never adopted"
    );
}

/// Transport whose quorum calls never complete, for deadline tests.
struct BlackholeTransport;

#[async_trait]
impl QuorumTransport for BlackholeTransport {
    async fn read(&self, _: &QuorumGroup, _: &str) -> Result<ReadReply, TransportError> {
        std::future::pending().await
    }

    async fn write(
        &self,
        _: &QuorumGroup,
        _: &str,
        _: &str,
        _: Timestamp,
    ) -> Result<WriteReply, TransportError> {
        std::future::pending().await
    }

    async fn list_keys(&self, _: &QuorumGroup) -> Result<Vec<String>, TransportError> {
        std::future::pending().await
    }

    async fn write_config(
        &self,
        _: &QuorumGroup,
        _: &ConfigDescriptor,
    ) -> Result<(), TransportError> {
        std::future::pending().await
    }

    async fn node_read(&self, _: &ReplicaAddr, _: &str) -> Result<NodeReadReply, TransportError> {
        std::future::pending().await
    }

    async fn node_write(
        &self,
        _: &ReplicaAddr,
        _: &str,
        _: &str,
        _: Timestamp,
    ) -> Result<WriteReply, TransportError> {
        std::future::pending().await
    }

    async fn node_list_keys(&self, _: &ReplicaAddr) -> Result<Vec<String>, TransportError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn hung_transport_hits_deadline_and_read_is_unavailable() {
    let nodes = vec![ReplicaAddr::new("127.0.0.1:7000")];
    let session = ClientSession::new(
        Arc::new(BlackholeTransport),
        nodes,
        ClientConfig {
            rpc_timeout: Duration::from_millis(50),
        },
    )
    .unwrap();

    assert_eq!(session.read("a").await, ReadOutcome::Unavailable);
}
