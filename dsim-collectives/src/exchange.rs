// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Pairwise exchange between two nodes.

use dsim_engine::node::Node;
use dsim_engine::types::{NodeId, SimError, SimResult};

/// Swap `data` with node `other`, which must make the matching call.
///
/// The node with the lower id sends first so the two rendezvous never wait on
/// each other.
pub fn exchange_with(node: &mut Node, other: NodeId, data: Vec<f64>) -> SimResult<Vec<f64>> {
    let id = node.id();
    if other == id {
        return Err(SimError::SelfCommunication(id));
    }

    if id < other {
        node.send(other, data)?;
        Ok(node.receive_from(other)?.into_payload())
    } else {
        let received = node.receive_from(other)?;
        node.send(other, data)?;
        Ok(received.into_payload())
    }
}
