//! Membership descriptor parser.
//!
//! Two grammars are accepted, resolved against the fixed, ordinal list of
//! node addresses the client was started with:
//!
//! - range syntax `"<start>:<stop>"`, either bound optional: `"2:5"`,
//!   `":3"`, `"7:"`, `":"` — selects the half-open slice of the node list;
//! - index-list syntax `"<i1>,<i2>,...,<ik>"` — selects exactly the
//!   referenced nodes in the order given, duplicates permitted.

use epochkv_transport::{QuorumGroup, ReplicaAddr};

use crate::error::{ClientResult, Error};

/// Resolve a membership descriptor into a callable quorum group.
///
/// The returned group requires replies from *all* selected nodes (full
/// quorum). Errors are always reported, never silently defaulted.
pub fn parse_membership(descriptor: &str, nodes: &[ReplicaAddr]) -> ClientResult<QuorumGroup> {
    if let Some(colon) = descriptor.find(':') {
        let (start_str, stop_str) = (&descriptor[..colon], &descriptor[colon + 1..]);

        let start = if start_str.is_empty() {
            0
        } else {
            parse_bound(descriptor, start_str)?
        };
        let stop = if stop_str.is_empty() {
            nodes.len()
        } else {
            parse_bound(descriptor, stop_str)?
        };

        if start >= stop {
            return Err(Error::invalid_descriptor(
                descriptor,
                format!("start {start} must be below stop {stop}"),
            ));
        }
        if stop > nodes.len() {
            return Err(Error::invalid_descriptor(
                descriptor,
                format!("stop {stop} exceeds node count {}", nodes.len()),
            ));
        }

        return Ok(QuorumGroup::new(nodes[start..stop].to_vec()));
    }

    let mut members = Vec::new();
    for part in descriptor.split(',') {
        let index = parse_bound(descriptor, part)?;
        let member = nodes.get(index).ok_or_else(|| {
            Error::invalid_descriptor(
                descriptor,
                format!("index {index} out of range for {} nodes", nodes.len()),
            )
        })?;
        members.push(member.clone());
    }

    Ok(QuorumGroup::new(members))
}

fn parse_bound(descriptor: &str, bound: &str) -> ClientResult<usize> {
    bound.trim().parse().map_err(|_| {
        Error::invalid_descriptor(descriptor, format!("'{bound}' is not a valid node index"))
    })
}
