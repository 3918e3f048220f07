// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! All-to-all: every node ends with the data of every node.
//!
//! # Function
//!
//! The [hypercube](crate::Strategy::Hypercube) strategy selects the ring form,
//! which needs no power-of-two node count. In each of the `N-1` rounds every
//! node passes the last item it received to its right-hand neighbour and takes
//! a new one from its left-hand neighbour. Even nodes send first and odd nodes
//! receive first, so with any `N` at least one receiver is always waiting and
//! the ring cannot lock up.
//!
//! The [naive](crate::Strategy::Naive) strategy handles one source at a time:
//! its data is moved to node 0 and then broadcast naively.

use dsim_engine::node::Node;
use dsim_engine::types::SimResult;
use dsim_track::trace;

use crate::{Strategy, broadcast};

/// Share `data` with every node.
///
/// The result is indexed by source node, so `result[j]` is node `j`'s `data`
/// on every node.
pub fn all_to_all(
    node: &mut Node,
    data: Vec<f64>,
    strategy: Strategy,
) -> SimResult<Vec<Vec<f64>>> {
    match strategy {
        Strategy::Hypercube => ring(node, data),
        Strategy::Naive => naive(node, data),
    }
}

/// Replace the local data of every node with the local data of all nodes
/// concatenated in node id order.
pub fn all_to_all_in_place(node: &mut Node, strategy: Strategy) -> SimResult {
    let data = node.data().to_vec();
    let result = all_to_all(node, data, strategy)?;
    node.set_data(result.concat());
    Ok(())
}

fn ring(node: &mut Node, data: Vec<f64>) -> SimResult<Vec<Vec<f64>>> {
    let id = node.id();
    let size = node.size();
    let right = (id + 1) % size;
    let left = (id + size - 1) % size;

    let mut result = vec![Vec::new(); size];
    let mut forward = data.clone();
    result[id] = data;

    for round in 0..size - 1 {
        let source = (id + size - round - 1) % size;
        trace!(node.entity ; "ring round {} receives data of node{}", round, source);
        let received = if id % 2 == 0 {
            node.send(right, forward)?;
            node.receive_from(left)?
        } else {
            let received = node.receive_from(left)?;
            node.send(right, forward)?;
            received
        };
        forward = received.into_payload();
        result[source] = forward.clone();
    }
    Ok(result)
}

fn naive(node: &mut Node, data: Vec<f64>) -> SimResult<Vec<Vec<f64>>> {
    let id = node.id();

    let mut result = Vec::with_capacity(node.size());
    for source in 0..node.size() {
        let mut item = if id == source { data.clone() } else { Vec::new() };
        if source != 0 {
            if id == source {
                node.send(0, item.clone())?;
            } else if id == 0 {
                item = node.receive_from(source)?.into_payload();
            }
        }
        result.push(broadcast::broadcast(node, item, Strategy::Naive)?);
    }
    Ok(result)
}
