// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Scatter from node 0 and its inverse, gather into node 0.
//!
//! # Function
//!
//! Node 0's data is viewed as `N` equal, contiguous shards; scatter leaves
//! shard `i` on node `i`, gather puts shard `i` back at position `i` of node
//! 0's buffer.
//!
//! With the [hypercube](crate::Strategy::Hypercube) strategy scatter works by
//! recursive halving: highest dimension first, every node holding data keeps
//! the first half and sends the second half across the current dimension.
//! Gather is the mirror image: lowest dimension first, nodes with bit `i` set
//! send everything they have collected and drop out, nodes with bit `i` clear
//! append it to their own.
//!
//! With the [naive](crate::Strategy::Naive) strategy node 0 exchanges a shard
//! with every other node in turn.

use dsim_engine::node::Node;
use dsim_engine::topology::{hypercube_dimension, hypercube_partner};
use dsim_engine::types::{SimError, SimResult};
use dsim_track::trace;

use crate::Strategy;

/// Split node 0's `data` so that node `i` gets back shard `i`.
///
/// The length of node 0's data must be a non-zero multiple of the number of
/// nodes. The `data` passed by other nodes is ignored.
pub fn scatter(node: &mut Node, data: Vec<f64>, strategy: Strategy) -> SimResult<Vec<f64>> {
    if node.id() == 0 && (data.is_empty() || data.len() % node.size() != 0) {
        return Err(SimError::IndivisiblePayload {
            len: data.len(),
            parts: node.size(),
        });
    }

    match strategy {
        Strategy::Hypercube => scatter_hypercube(node, data),
        Strategy::Naive => scatter_naive(node, data),
    }
}

/// Scatter node 0's local data over the local data of every node.
pub fn scatter_in_place(node: &mut Node, strategy: Strategy) -> SimResult {
    let data = node.data().to_vec();
    let result = scatter(node, data, strategy)?;
    node.set_data(result);
    Ok(())
}

/// Concatenate the `data` of every node, in node id order, into node 0.
///
/// Node 0 gets back the full buffer. Other nodes get back what they had
/// collected when they handed it on.
pub fn gather(node: &mut Node, data: Vec<f64>, strategy: Strategy) -> SimResult<Vec<f64>> {
    match strategy {
        Strategy::Hypercube => gather_hypercube(node, data),
        Strategy::Naive => gather_naive(node, data),
    }
}

/// Gather the local data of every node into the local data of node 0.
pub fn gather_in_place(node: &mut Node, strategy: Strategy) -> SimResult {
    let data = node.data().to_vec();
    let result = gather(node, data, strategy)?;
    node.set_data(result);
    Ok(())
}

fn scatter_hypercube(node: &mut Node, data: Vec<f64>) -> SimResult<Vec<f64>> {
    let d = hypercube_dimension(node.size())?;
    let id = node.id();

    let mut held = if id == 0 { data } else { Vec::new() };
    let mut mask = node.size() - 1;
    for i in (0..d).rev() {
        mask ^= 1 << i;
        if id & mask != 0 {
            continue;
        }

        let partner = hypercube_partner(id, i);
        trace!(node.entity ; "scatter round {} with node{}", i, partner);
        if id & (1 << i) == 0 {
            let upper = held.split_off(held.len() / 2);
            node.send(partner, upper)?;
        } else {
            held = node.receive_from(partner)?.into_payload();
        }
    }
    Ok(held)
}

fn scatter_naive(node: &mut Node, data: Vec<f64>) -> SimResult<Vec<f64>> {
    if node.id() != 0 {
        return Ok(node.receive_from(0)?.into_payload());
    }

    let shard = data.len() / node.size();
    for (to, chunk) in data.chunks(shard).enumerate().skip(1) {
        node.send(to, chunk.to_vec())?;
    }
    Ok(data[..shard].to_vec())
}

fn gather_hypercube(node: &mut Node, data: Vec<f64>) -> SimResult<Vec<f64>> {
    let d = hypercube_dimension(node.size())?;
    let id = node.id();

    let mut held = data;
    let mut mask = 0;
    for i in 0..d {
        if id & mask == 0 {
            let partner = hypercube_partner(id, i);
            trace!(node.entity ; "gather round {} with node{}", i, partner);
            if id & (1 << i) != 0 {
                node.send(partner, held.clone())?;
            } else {
                let received = node.receive_from(partner)?;
                held.extend_from_slice(received.payload());
            }
        }
        mask |= 1 << i;
    }
    Ok(held)
}

fn gather_naive(node: &mut Node, data: Vec<f64>) -> SimResult<Vec<f64>> {
    if node.id() != 0 {
        node.send(0, data.clone())?;
        return Ok(data);
    }

    let mut held = data;
    for from in 1..node.size() {
        let received = node.receive_from(from)?;
        held.extend_from_slice(received.payload());
    }
    Ok(held)
}
