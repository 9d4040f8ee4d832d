//! Three-phase reconfiguration protocol.
//!
//! Migration from the current configuration to a new one proceeds in three
//! strictly ordered phases: announce the pending configuration to the old
//! group, transfer every key into the new group, then activate the new
//! configuration and switch the session over. No phase is retried and there
//! is no rollback; the protocol is best-effort by contract, and readers
//! reconcile any mixed state through the configuration chain.

use epochkv_transport::{ConfigDescriptor, QuorumGroup, QuorumTransport};
use tracing::{info, warn};

use crate::error::ClientResult;
use crate::parser::parse_membership;
use crate::session::ClientSession;

/// Outcome of transferring one key to the new configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyTransfer {
    /// Read from the old group and accepted by the new one.
    Transferred,
    /// Listed by the old group but gone by the time it was read.
    Missing,
    /// The new group judged the migration write stale.
    Stale,
    /// The read from the old group failed or timed out.
    SourceUnavailable,
    /// The write to the new group failed or timed out.
    TargetUnavailable,
}

/// One key's migration record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyMigration {
    /// The key.
    pub key: String,
    /// What happened to it.
    pub outcome: KeyTransfer,
}

/// Result report of a reconfiguration run.
///
/// Reconfiguration is non-transactional: any subset of these steps may have
/// failed without aborting the run. The report says which did.
#[derive(Clone, Debug)]
pub struct MigrationReport {
    /// The activated descriptor the session now believes authoritative.
    pub target: ConfigDescriptor,
    /// Whether the old group acknowledged the pending announcement.
    pub announced: bool,
    /// Whether the old group answered the key listing. When false, no keys
    /// were transferred.
    pub listed: bool,
    /// Whether the new group acknowledged the activation.
    pub activated: bool,
    /// Per-key transfer outcomes, in listing order.
    pub keys: Vec<KeyMigration>,
}

impl MigrationReport {
    /// Whether every step succeeded and every key transferred.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.announced
            && self.listed
            && self.activated
            && self
                .keys
                .iter()
                .all(|migration| migration.outcome == KeyTransfer::Transferred)
    }
}

impl<T: QuorumTransport> ClientSession<T> {
    /// Migrate the live dataset to the configuration described by
    /// `new_membership` and make it the session's current configuration.
    ///
    /// A malformed or out-of-range descriptor aborts before any side
    /// effect. After that point the run always completes and always
    /// switches the session over; partial failures are recorded in the
    /// returned [`MigrationReport`] rather than raised.
    pub async fn reconf(&self, new_membership: &str) -> ClientResult<MigrationReport> {
        let target_group = parse_membership(new_membership, &self.nodes)?;
        let mut state = self.state.write().await;

        // Phase 1: announce the pending configuration to the old group.
        // Replicas surface it to other clients and stop taking new writes.
        let descriptor = ConfigDescriptor::pending(new_membership, self.clock.now());
        info!(config = %descriptor, "announcing pending configuration");
        let announced = self
            .ops()
            .write_config(&state.group, &descriptor)
            .await
            .is_ok();

        // Phase 2: transfer state, one key at a time. A key's failure never
        // aborts the others.
        let (listed, keys) = match self.ops().list_keys(&state.group).await {
            Ok(keys) => (true, keys),
            Err(_) => (false, Vec::new()),
        };
        let mut migrations = Vec::with_capacity(keys.len());
        for key in keys {
            let outcome = self.transfer_key(&key, &state.group, &target_group).await;
            if outcome != KeyTransfer::Transferred {
                warn!(key, ?outcome, "key not transferred");
            }
            migrations.push(KeyMigration { key, outcome });
        }

        // Phase 3: activate the new configuration and switch over. The old
        // group is not decommissioned here; its replicas keep pointing at
        // the successor and the read chain does the rest.
        let descriptor = descriptor.activated();
        let activated = self
            .ops()
            .write_config(&target_group, &descriptor)
            .await
            .is_ok();
        state.descriptor = descriptor.clone();
        state.group = target_group;
        info!(config = %descriptor, keys = migrations.len(), "switched to new configuration");

        Ok(MigrationReport {
            target: descriptor,
            announced,
            listed,
            activated,
            keys: migrations,
        })
    }

    async fn transfer_key(
        &self,
        key: &str,
        source: &QuorumGroup,
        target: &QuorumGroup,
    ) -> KeyTransfer {
        let reply = match self.ops().read(source, key).await {
            Ok(reply) => reply,
            Err(_) => return KeyTransfer::SourceUnavailable,
        };
        if !reply.found {
            return KeyTransfer::Missing;
        }
        match self
            .ops()
            .write(target, key, &reply.value, self.clock.now())
            .await
        {
            Ok(write) if write.accepted => KeyTransfer::Transferred,
            Ok(_) => KeyTransfer::Stale,
            Err(_) => KeyTransfer::TargetUnavailable,
        }
    }
}
