// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! One-to-all broadcast from node 0.
//!
//! # Function
//!
//! With the [hypercube](crate::Strategy::Hypercube) strategy the data spreads
//! across one dimension per round, highest dimension first. In round `i` only
//! the nodes whose bits below `i` are all zero take part: those with bit `i`
//! clear already hold the data and send it, those with bit `i` set receive it.
//! All `N` nodes hold the data after `log2(N)` rounds.
//!
//! With the [naive](crate::Strategy::Naive) strategy node 0 sends to every
//! other node in turn.

use dsim_engine::node::Node;
use dsim_engine::topology::{hypercube_dimension, hypercube_partner};
use dsim_engine::types::SimResult;
use dsim_track::trace;

use crate::Strategy;

/// Broadcast node 0's `data` to every node.
///
/// Every node gets node 0's data back. The `data` passed by other nodes is
/// ignored.
pub fn broadcast(node: &mut Node, data: Vec<f64>, strategy: Strategy) -> SimResult<Vec<f64>> {
    match strategy {
        Strategy::Hypercube => hypercube(node, data),
        Strategy::Naive => naive(node, data),
    }
}

/// Broadcast node 0's local data into the local data of every node.
pub fn broadcast_in_place(node: &mut Node, strategy: Strategy) -> SimResult {
    let data = node.data().to_vec();
    let result = broadcast(node, data, strategy)?;
    node.set_data(result);
    Ok(())
}

/// [broadcast] followed by a barrier, so no node returns before every node
/// holds the data.
pub fn broadcast_with_barrier(
    node: &mut Node,
    data: Vec<f64>,
    strategy: Strategy,
) -> SimResult<Vec<f64>> {
    let result = broadcast(node, data, strategy)?;
    node.synchronize()?;
    Ok(result)
}

fn hypercube(node: &mut Node, mut data: Vec<f64>) -> SimResult<Vec<f64>> {
    let d = hypercube_dimension(node.size())?;
    let id = node.id();

    let mut mask = node.size() - 1;
    for i in (0..d).rev() {
        mask ^= 1 << i;
        if id & mask != 0 {
            continue;
        }

        let partner = hypercube_partner(id, i);
        trace!(node.entity ; "broadcast round {} with node{}", i, partner);
        if id & (1 << i) == 0 {
            node.send(partner, data.clone())?;
        } else {
            data = node.receive_from(partner)?.into_payload();
        }
    }
    Ok(data)
}

fn naive(node: &mut Node, data: Vec<f64>) -> SimResult<Vec<f64>> {
    if node.id() == 0 {
        for to in 1..node.size() {
            node.send(to, data.clone())?;
        }
        Ok(data)
    } else {
        Ok(node.receive_from(0)?.into_payload())
    }
}
