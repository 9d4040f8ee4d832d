//! Client-side coordination for a replicated, reconfigurable key-value
//! store.
//!
//! Storage replicas are organized into *configurations*: timestamped groups
//! of replicas, of which the newest started one is authoritative. This crate
//! provides everything a client needs to operate against such a deployment:
//!
//! - a membership parser turning operator descriptors (`"0:3"`, `"0,2,4"`)
//!   into callable [`QuorumGroup`]s,
//! - a configuration-chain [`read`](ClientSession::read) that hops through
//!   superseded configurations until it finds the live one, repairing the
//!   session's belief along the way,
//! - a three-phase [`reconf`](ClientSession::reconf) that announces a new
//!   configuration, migrates every key into it, and activates it,
//! - quorum and single-replica operations with fixed per-call deadlines.
//!
//! The quorum transport itself is pluggable via the
//! [`QuorumTransport`] seam; `epochkv-transport-memory` provides an
//! in-process implementation for tests and local development.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod parser;

mod chain;
mod clock;
mod ops;
mod reconf;
mod session;

pub use chain::ReadOutcome;
pub use clock::WallClock;
pub use config::ClientConfig;
pub use error::{ClientResult, Error};
pub use reconf::{KeyMigration, KeyTransfer, MigrationReport};
pub use session::ClientSession;

pub use epochkv_transport::{
    ConfigDescriptor, NodeReadReply, QuorumGroup, QuorumTransport, ReadReply, ReplicaAddr,
    Timestamp, TransportError, WriteReply,
};
