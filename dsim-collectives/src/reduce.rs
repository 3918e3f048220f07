// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! All-to-one reduction into node 0, and all-reduce.
//!
//! # Function
//!
//! With the [hypercube](crate::Strategy::Hypercube) strategy partial results
//! are combined across one dimension per round, lowest dimension first. In
//! round `i` only the nodes whose bits below `i` are all zero take part: those
//! with bit `i` set send their partial result and drop out, those with bit `i`
//! clear receive it and combine it with their own.
//!
//! With the [naive](crate::Strategy::Naive) strategy the partial result travels
//! down a chain from node `N-1` to node 0, each node adding its own
//! contribution on the way.
//!
//! Contributions are always combined in node id order, see [ops](crate::ops).

use dsim_engine::node::Node;
use dsim_engine::topology::{hypercube_dimension, hypercube_partner};
use dsim_engine::types::SimResult;
use dsim_track::trace;

use crate::ops::combine;
use crate::{Strategy, broadcast};

/// Combine the `data` of every node with `op` into node 0.
///
/// Node 0 gets back the full reduction. Other nodes get back the partial
/// result they held when they handed it on.
pub fn reduce<F>(node: &mut Node, data: Vec<f64>, op: F, strategy: Strategy) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    match strategy {
        Strategy::Hypercube => hypercube(node, data, &op),
        Strategy::Naive => naive(node, data, &op),
    }
}

/// Reduce the local data of every node into the local data of node 0.
pub fn reduce_in_place<F>(node: &mut Node, op: F, strategy: Strategy) -> SimResult
where
    F: Fn(f64, f64) -> f64,
{
    let data = node.data().to_vec();
    let result = reduce(node, data, op, strategy)?;
    node.set_data(result);
    Ok(())
}

/// [reduce] followed by a barrier, so no node returns before node 0 holds the
/// full reduction.
pub fn reduce_with_barrier<F>(
    node: &mut Node,
    data: Vec<f64>,
    op: F,
    strategy: Strategy,
) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let result = reduce(node, data, op, strategy)?;
    node.synchronize()?;
    Ok(result)
}

/// Reduce into node 0 and broadcast the result, so every node gets the full
/// reduction.
pub fn all_reduce<F>(
    node: &mut Node,
    data: Vec<f64>,
    op: F,
    strategy: Strategy,
) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let reduced = reduce(node, data, op, strategy)?;
    broadcast::broadcast(node, reduced, strategy)
}

/// All-reduce the local data of every node.
pub fn all_reduce_in_place<F>(node: &mut Node, op: F, strategy: Strategy) -> SimResult
where
    F: Fn(f64, f64) -> f64,
{
    let data = node.data().to_vec();
    let result = all_reduce(node, data, op, strategy)?;
    node.set_data(result);
    Ok(())
}

fn hypercube<F>(node: &mut Node, data: Vec<f64>, op: &F) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let d = hypercube_dimension(node.size())?;
    let id = node.id();

    let mut acc = data;
    let mut mask = 0;
    for i in 0..d {
        if id & mask == 0 {
            let partner = hypercube_partner(id, i);
            trace!(node.entity ; "reduce round {} with node{}", i, partner);
            if id & (1 << i) != 0 {
                node.send(partner, acc.clone())?;
            } else {
                let received = node.receive_from(partner)?;
                acc = combine(&acc, received.payload(), op)?;
            }
        }
        mask |= 1 << i;
    }
    Ok(acc)
}

fn naive<F>(node: &mut Node, data: Vec<f64>, op: &F) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    let id = node.id();
    let last = node.size() - 1;

    let mut acc = data;
    if id < last {
        let received = node.receive_from(id + 1)?;
        acc = combine(&acc, received.payload(), op)?;
    }
    if id > 0 {
        node.send(id - 1, acc.clone())?;
    }
    Ok(acc)
}
