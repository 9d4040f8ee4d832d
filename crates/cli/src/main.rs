//! Interactive local harness for the coordination layer.
//!
//! Boots an in-process cluster of memory replicas, binds a client session
//! to it, and executes commands from stdin. Useful for poking at the
//! configuration-chain and reconfiguration protocols without a deployment.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use epochkv_client::{ClientConfig, ClientSession, ReadOutcome, ReplicaAddr};
use epochkv_transport_memory::MemoryCluster;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Client/session error
    #[error(transparent)]
    Client(#[from] epochkv_client::Error),

    /// Stdin error
    #[error("stdin error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of in-process replicas to boot
    #[arg(long, default_value_t = 5, env = "EPOCHKV_NODES")]
    nodes: usize,

    /// Per-call deadline in milliseconds
    #[arg(long, default_value_t = 1000, env = "EPOCHKV_RPC_TIMEOUT_MS")]
    rpc_timeout_ms: u64,
}

const HELP: &str = "\
commands:
  read <key>                 chain read through the configuration chain
  write <key> <value>        quorum write under the current configuration
  list                       list keys under the current configuration
  reconf <membership>        migrate to a new configuration (e.g. 0:3 or 0,2,4)
  config                     show the configuration this session believes in
  node read <i> <key>        diagnostic read against one replica
  node write <i> <key> <v>   diagnostic write against one replica
  node list <i>              diagnostic key listing against one replica
  down <i> | up <i>          toggle replica reachability
  help | exit";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "epochkv_client=info,epochkv_cli=info".into()),
        )
        .init();

    let args = Args::parse();
    let nodes: Vec<ReplicaAddr> = (0..args.nodes)
        .map(|i| ReplicaAddr::new(format!("127.0.0.1:{}", 5000 + i)))
        .collect();
    let cluster = MemoryCluster::new(&nodes);
    let session = ClientSession::new(
        Arc::new(cluster.clone()),
        nodes.clone(),
        ClientConfig {
            rpc_timeout: Duration::from_millis(args.rpc_timeout_ms),
        },
    )?;

    info!(replicas = args.nodes, "local cluster ready");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["exit"] | ["quit"] => break,
            ["help"] => println!("{HELP}"),
            ["read", key] => match session.read(key).await {
                ReadOutcome::Found { value, timestamp } => println!("{value} @ {timestamp}"),
                ReadOutcome::NotFound => println!("(not found)"),
                ReadOutcome::Unavailable => println!("(unavailable)"),
            },
            ["write", key, value] => match session.write(key, value).await {
                Ok(reply) if reply.accepted => println!("ok"),
                Ok(_) => println!("(stale, dropped)"),
                Err(err) => println!("error: {err}"),
            },
            ["list"] => match session.list_keys().await {
                Ok(keys) => println!("{}", keys.join("\n")),
                Err(err) => println!("error: {err}"),
            },
            ["reconf", membership] => match session.reconf(membership).await {
                Ok(report) => {
                    println!(
                        "now on {} (announced: {}, activated: {})",
                        report.target, report.announced, report.activated
                    );
                    for migration in &report.keys {
                        println!("  {}: {:?}", migration.key, migration.outcome);
                    }
                }
                Err(err) => println!("error: {err}"),
            },
            ["config"] => println!("{}", session.current_config().await),
            ["node", "read", index, key] => match parse_index(index) {
                Some(index) => match session.node_read(index, key).await {
                    Ok(reply) if reply.found => println!("{} @ {}", reply.value, reply.timestamp),
                    Ok(_) => println!("(not found)"),
                    Err(err) => println!("error: {err}"),
                },
                None => println!("bad index: {index}"),
            },
            ["node", "write", index, key, value] => match parse_index(index) {
                Some(index) => match session.node_write(index, key, value).await {
                    Ok(reply) if reply.accepted => println!("ok"),
                    Ok(_) => println!("(stale, dropped)"),
                    Err(err) => println!("error: {err}"),
                },
                None => println!("bad index: {index}"),
            },
            ["node", "list", index] => match parse_index(index) {
                Some(index) => match session.node_list_keys(index).await {
                    Ok(keys) => println!("{}", keys.join("\n")),
                    Err(err) => println!("error: {err}"),
                },
                None => println!("bad index: {index}"),
            },
            [verb @ ("down" | "up"), index] => match parse_index(index) {
                Some(index) if index < nodes.len() => {
                    cluster.set_reachable(&nodes[index], *verb == "up").await;
                    println!("{} is {verb}", nodes[index]);
                }
                _ => println!("bad index: {index}"),
            },
            _ => println!("unknown command, try 'help'"),
        }
    }

    Ok(())
}

fn parse_index(raw: &str) -> Option<usize> {
    raw.parse().ok()
}
