// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Inclusive prefix scan: node `i` ends with `v0 op v1 op ... op vi`.
//!
//! # Function
//!
//! The [hypercube](crate::Strategy::Hypercube) strategy works in two sweeps.
//! The up-sweep builds, lowest dimension first, the combination of each block
//! of `2^(i+1)` nodes in the highest node of that block. The down-sweep then
//! walks back down the dimensions, sending completed prefixes forward into the
//! blocks that are still missing the contribution of the nodes before them.
//!
//! The [naive](crate::Strategy::Naive) strategy passes the running prefix down
//! the chain from node 0 to node `N-1`.
//!
//! [`scan_exchange`] is an alternative hypercube form built on
//! [`exchange_with`]: in every round each node swaps the combination of its
//! current sub-cube with its partner, and adds the partner's value to its own
//! result only when the partner has the lower id.

use dsim_engine::node::Node;
use dsim_engine::topology::{hypercube_dimension, hypercube_partner};
use dsim_engine::types::SimResult;
use dsim_track::trace;

use crate::Strategy;
use crate::exchange::exchange_with;
use crate::ops::combine;

/// Inclusive prefix combination of the `data` of nodes `0..=id` under `op`.
pub fn scan<F>(node: &mut Node, data: Vec<f64>, op: F, strategy: Strategy) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    match strategy {
        Strategy::Hypercube => hypercube(node, data, &op),
        Strategy::Naive => naive(node, data, &op),
    }
}

/// Replace the local data of every node with its inclusive prefix.
pub fn scan_in_place<F>(node: &mut Node, op: F, strategy: Strategy) -> SimResult
where
    F: Fn(f64, f64) -> f64,
{
    let data = node.data().to_vec();
    let result = scan(node, data, op, strategy)?;
    node.set_data(result);
    Ok(())
}

/// Same result as [`scan`] using `log2(N)` rounds of pairwise exchanges.
pub fn scan_exchange<F>(node: &mut Node, data: Vec<f64>, op: F) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let d = hypercube_dimension(node.size())?;
    let id = node.id();

    let mut result = data.clone();
    let mut message = data;
    for i in 0..d {
        let partner = hypercube_partner(id, i);
        let received = exchange_with(node, partner, message.clone())?;
        if partner < id {
            result = combine(&received, &result, &op)?;
            message = combine(&received, &message, &op)?;
        } else {
            message = combine(&message, &received, &op)?;
        }
    }
    Ok(result)
}

/// Replace the local data of every node with its inclusive prefix using
/// [`scan_exchange`].
pub fn scan_exchange_in_place<F>(node: &mut Node, op: F) -> SimResult
where
    F: Fn(f64, f64) -> f64,
{
    let data = node.data().to_vec();
    let result = scan_exchange(node, data, op)?;
    node.set_data(result);
    Ok(())
}

fn hypercube<F>(node: &mut Node, data: Vec<f64>, op: &F) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let d = hypercube_dimension(node.size())?;
    let id = node.id();
    let size = node.size();

    let mut acc = data;

    // Up-sweep: nodes whose low `i` bits are all set hold a block total
    for i in 0..d {
        let low = (1 << i) - 1;
        if id & low != low {
            continue;
        }
        let partner = hypercube_partner(id, i);
        trace!(node.entity ; "scan up-sweep round {} with node{}", i, partner);
        if id & (1 << i) == 0 {
            node.send(partner, acc.clone())?;
        } else {
            let received = node.receive_from(partner)?;
            acc = combine(received.payload(), &acc, op)?;
        }
    }

    // Down-sweep: push finished prefixes into the blocks that follow them
    for i in (0..d.saturating_sub(1)).rev() {
        let step = 1 << i;
        let low = step - 1;
        if id & low != low {
            continue;
        }
        if id & step != 0 {
            if id + step < size {
                trace!(node.entity ; "scan down-sweep round {} to node{}", i, id + step);
                node.send(id + step, acc.clone())?;
            }
        } else if id >= step {
            trace!(node.entity ; "scan down-sweep round {} from node{}", i, id - step);
            let received = node.receive_from(id - step)?;
            acc = combine(received.payload(), &acc, op)?;
        }
    }
    Ok(acc)
}

fn naive<F>(node: &mut Node, data: Vec<f64>, op: &F) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let id = node.id();

    let mut acc = data;
    if id > 0 {
        let received = node.receive_from(id - 1)?;
        acc = combine(received.payload(), &acc, op)?;
    }
    if id + 1 < node.size() {
        node.send(id + 1, acc.clone())?;
    }
    Ok(acc)
}
