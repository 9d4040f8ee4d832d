//! In-memory quorum transport for testing and local development.
//!
//! The cluster hosts every replica in the current process and routes quorum
//! calls to them directly. Each replica keeps a last-write-wins entry map
//! and the set of configuration descriptors it has been told about; replies
//! are combined under the full-quorum policy of the target group, so a
//! single unreachable member fails the whole call.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use epochkv_transport::{
    ConfigDescriptor, NodeReadReply, QuorumGroup, QuorumTransport, ReadReply, ReplicaAddr,
    Timestamp, TransportError, WriteReply,
};
use tokio::sync::Mutex;
use tracing::debug;

/// A stored key-value entry.
#[derive(Clone, Debug)]
struct Entry {
    value: String,
    timestamp: Timestamp,
}

/// State of one in-memory replica.
#[derive(Debug, Default)]
struct ReplicaState {
    entries: HashMap<String, Entry>,
    /// Configurations this replica knows about, keyed by creation time.
    /// All of them are attached to every read reply.
    configs: BTreeMap<Timestamp, ConfigDescriptor>,
    reachable: bool,
}

/// An in-process cluster of storage replicas implementing
/// [`QuorumTransport`].
#[derive(Clone, Debug, Default)]
pub struct MemoryCluster {
    replicas: Arc<DashMap<ReplicaAddr, Arc<Mutex<ReplicaState>>>>,
}

impl MemoryCluster {
    /// Create a cluster hosting one reachable replica per address.
    #[must_use]
    pub fn new(addrs: &[ReplicaAddr]) -> Self {
        let replicas = DashMap::new();
        for addr in addrs {
            replicas.insert(
                addr.clone(),
                Arc::new(Mutex::new(ReplicaState {
                    reachable: true,
                    ..ReplicaState::default()
                })),
            );
        }
        Self {
            replicas: Arc::new(replicas),
        }
    }

    /// Mark a replica reachable or unreachable. An unreachable member fails
    /// every quorum call that targets it.
    pub async fn set_reachable(&self, addr: &ReplicaAddr, reachable: bool) {
        // Clone the handle out so no map shard guard is held across await.
        if let Ok(replica) = self.replica(addr) {
            replica.lock().await.reachable = reachable;
        }
    }

    /// Plant a configuration descriptor on one replica, as if it had been
    /// announced there. Useful for building discovery-chain scenarios.
    pub async fn seed_config(&self, addr: &ReplicaAddr, descriptor: ConfigDescriptor) {
        if let Ok(replica) = self.replica(addr) {
            replica
                .lock()
                .await
                .configs
                .insert(descriptor.timestamp, descriptor);
        }
    }

    fn replica(&self, addr: &ReplicaAddr) -> Result<Arc<Mutex<ReplicaState>>, TransportError> {
        self.replicas
            .get(addr)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TransportError::UnknownReplica(addr.clone()))
    }

    /// Look up every member of the group, failing if any is unknown.
    fn group_replicas(
        &self,
        group: &QuorumGroup,
    ) -> Result<Vec<(ReplicaAddr, Arc<Mutex<ReplicaState>>)>, TransportError> {
        if group.is_empty() {
            return Err(TransportError::EmptyGroup);
        }
        group
            .members()
            .iter()
            .map(|addr| Ok((addr.clone(), self.replica(addr)?)))
            .collect()
    }
}

fn require_reachable(addr: &ReplicaAddr, state: &ReplicaState) -> Result<(), TransportError> {
    if state.reachable {
        Ok(())
    } else {
        Err(TransportError::Unreachable(addr.clone()))
    }
}

#[async_trait]
impl QuorumTransport for MemoryCluster {
    async fn read(&self, group: &QuorumGroup, key: &str) -> Result<ReadReply, TransportError> {
        debug!(%group, key, "quorum read");
        let mut best: Option<Entry> = None;
        let mut configs: BTreeMap<Timestamp, ConfigDescriptor> = BTreeMap::new();

        for (addr, replica) in self.group_replicas(group)? {
            let state = replica.lock().await;
            require_reachable(&addr, &state)?;
            if let Some(entry) = state.entries.get(key) {
                let newer = best
                    .as_ref()
                    .is_none_or(|current| entry.timestamp > current.timestamp);
                if newer {
                    best = Some(entry.clone());
                }
            }
            // A pending descriptor and its activated twin share a timestamp;
            // the activated one must survive the union or clients would
            // never observe the activation.
            for (ts, descriptor) in &state.configs {
                configs
                    .entry(*ts)
                    .and_modify(|existing| {
                        if descriptor.started && !existing.started {
                            *existing = descriptor.clone();
                        }
                    })
                    .or_insert_with(|| descriptor.clone());
            }
        }

        let configs = configs.into_values().collect();
        Ok(match best {
            Some(entry) => ReadReply {
                found: true,
                value: entry.value,
                timestamp: entry.timestamp,
                configs,
            },
            None => ReadReply {
                found: false,
                value: String::new(),
                timestamp: Timestamp::ZERO,
                configs,
            },
        })
    }

    async fn write(
        &self,
        group: &QuorumGroup,
        key: &str,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<WriteReply, TransportError> {
        debug!(%group, key, %timestamp, "quorum write");
        let mut accepted = true;

        for (addr, replica) in self.group_replicas(group)? {
            let mut state = replica.lock().await;
            require_reachable(&addr, &state)?;
            let stale = state
                .entries
                .get(key)
                .is_some_and(|entry| timestamp <= entry.timestamp);
            if stale {
                accepted = false;
            } else {
                state.entries.insert(
                    key.to_string(),
                    Entry {
                        value: value.to_string(),
                        timestamp,
                    },
                );
            }
        }

        Ok(WriteReply { accepted })
    }

    async fn list_keys(&self, group: &QuorumGroup) -> Result<Vec<String>, TransportError> {
        debug!(%group, "quorum list keys");
        let mut keys = HashSet::new();
        for (addr, replica) in self.group_replicas(group)? {
            let state = replica.lock().await;
            require_reachable(&addr, &state)?;
            keys.extend(state.entries.keys().cloned());
        }
        let mut keys: Vec<String> = keys.into_iter().collect();
        keys.sort();
        Ok(keys)
    }

    async fn write_config(
        &self,
        group: &QuorumGroup,
        descriptor: &ConfigDescriptor,
    ) -> Result<(), TransportError> {
        debug!(%group, %descriptor, "quorum write config");
        for (addr, replica) in self.group_replicas(group)? {
            let mut state = replica.lock().await;
            require_reachable(&addr, &state)?;
            state
                .configs
                .insert(descriptor.timestamp, descriptor.clone());
        }
        Ok(())
    }

    async fn node_read(
        &self,
        replica: &ReplicaAddr,
        key: &str,
    ) -> Result<NodeReadReply, TransportError> {
        let state = self.replica(replica)?;
        let state = state.lock().await;
        require_reachable(replica, &state)?;
        Ok(match state.entries.get(key) {
            Some(entry) => NodeReadReply {
                found: true,
                value: entry.value.clone(),
                timestamp: entry.timestamp,
            },
            None => NodeReadReply {
                found: false,
                value: String::new(),
                timestamp: Timestamp::ZERO,
            },
        })
    }

    async fn node_write(
        &self,
        replica: &ReplicaAddr,
        key: &str,
        value: &str,
        timestamp: Timestamp,
    ) -> Result<WriteReply, TransportError> {
        let state = self.replica(replica)?;
        let mut state = state.lock().await;
        require_reachable(replica, &state)?;
        let stale = state
            .entries
            .get(key)
            .is_some_and(|entry| timestamp <= entry.timestamp);
        if !stale {
            state.entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    timestamp,
                },
            );
        }
        Ok(WriteReply { accepted: !stale })
    }

    async fn node_list_keys(&self, replica: &ReplicaAddr) -> Result<Vec<String>, TransportError> {
        let state = self.replica(replica)?;
        let state = state.lock().await;
        require_reachable(replica, &state)?;
        let mut keys: Vec<String> = state.entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(n: usize) -> Vec<ReplicaAddr> {
        (0..n)
            .map(|i| ReplicaAddr::new(format!("127.0.0.1:{}", 9000 + i)))
            .collect()
    }

    #[tokio::test]
    async fn read_returns_newest_replica_value() {
        let nodes = addrs(3);
        let cluster = MemoryCluster::new(&nodes);

        // A split write: one replica holds a newer value than the others.
        cluster
            .node_write(&nodes[0], "k", "old", Timestamp::new(1, 0))
            .await
            .unwrap();
        cluster
            .node_write(&nodes[1], "k", "new", Timestamp::new(2, 0))
            .await
            .unwrap();

        let group = QuorumGroup::new(nodes.clone());
        let reply = cluster.read(&group, "k").await.unwrap();
        assert!(reply.found);
        assert_eq!(reply.value, "new");
        assert_eq!(reply.timestamp, Timestamp::new(2, 0));
    }

    #[tokio::test]
    async fn stale_write_is_rejected() {
        let nodes = addrs(2);
        let cluster = MemoryCluster::new(&nodes);
        let group = QuorumGroup::new(nodes);

        let first = cluster
            .write(&group, "k", "v1", Timestamp::new(5, 0))
            .await
            .unwrap();
        assert!(first.accepted);

        let stale = cluster
            .write(&group, "k", "v0", Timestamp::new(4, 0))
            .await
            .unwrap();
        assert!(!stale.accepted);

        let reply = cluster.read(&group, "k").await.unwrap();
        assert_eq!(reply.value, "v1");
    }

    #[tokio::test]
    async fn list_keys_is_union() {
        let nodes = addrs(2);
        let cluster = MemoryCluster::new(&nodes);

        cluster
            .node_write(&nodes[0], "a", "1", Timestamp::new(1, 0))
            .await
            .unwrap();
        cluster
            .node_write(&nodes[1], "b", "2", Timestamp::new(1, 0))
            .await
            .unwrap();

        let group = QuorumGroup::new(nodes);
        let keys = cluster.list_keys(&group).await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_member_fails_the_call() {
        let nodes = addrs(3);
        let cluster = MemoryCluster::new(&nodes);
        cluster.set_reachable(&nodes[2], false).await;

        let group = QuorumGroup::new(nodes.clone());
        let err = cluster.read(&group, "k").await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(addr) if addr == nodes[2]));

        // A group that avoids the dead member still works.
        let healthy = QuorumGroup::new(nodes[..2].to_vec());
        assert!(cluster.read(&healthy, "k").await.is_ok());
    }

    #[tokio::test]
    async fn announced_configs_ride_on_read_replies() {
        let nodes = addrs(2);
        let cluster = MemoryCluster::new(&nodes);
        let group = QuorumGroup::new(nodes);

        let descriptor = ConfigDescriptor::pending("0:1", Timestamp::new(7, 0));
        cluster.write_config(&group, &descriptor).await.unwrap();

        let reply = cluster.read(&group, "missing").await.unwrap();
        assert!(!reply.found);
        assert_eq!(reply.configs, vec![descriptor]);
    }

    #[tokio::test]
    async fn unknown_replica_is_an_error() {
        let cluster = MemoryCluster::new(&addrs(1));
        let stranger = ReplicaAddr::new("127.0.0.1:1");
        let err = cluster.node_read(&stranger, "k").await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownReplica(_)));
    }
}
