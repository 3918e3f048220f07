// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dsim_collectives::{Strategy, broadcast, ops, reduce};
use dsim_engine::node::Node;
use dsim_engine::sim_error;
use dsim_engine::types::{SimError, SimResult};

mod common;

#[test]
fn reaches_every_node() {
    for strategy in Strategy::ALL {
        for size in common::POWERS_OF_TWO {
            let (system, result) = common::run(
                file!(),
                common::only_on_root(size, vec![1.0, 2.0, 3.0]),
                move |node: &mut Node| broadcast::broadcast_in_place(node, strategy),
            );
            result.unwrap();
            for i in 0..size {
                assert_eq!(system.data(i).unwrap(), &[1.0, 2.0, 3.0], "{strategy} N={size}");
            }
            assert_eq!(system.stats().messages(), (size - 1) as u64);
        }
    }
}

#[test]
fn data_of_other_nodes_ignored() {
    for strategy in Strategy::ALL {
        let (system, result) = common::run(file!(), common::ids_as_data(4), move |node: &mut Node| {
            broadcast::broadcast_in_place(node, strategy)
        });
        result.unwrap();
        for i in 0..4 {
            assert_eq!(system.data(i).unwrap(), &[0.0]);
        }
    }
}

#[test]
fn naive_works_for_any_size() {
    let (system, result) = common::run(
        file!(),
        common::only_on_root(5, vec![7.0]),
        |node: &mut Node| broadcast::broadcast_in_place(node, Strategy::Naive),
    );
    result.unwrap();
    for i in 0..5 {
        assert_eq!(system.data(i).unwrap(), &[7.0]);
    }
}

#[test]
fn hypercube_needs_power_of_two() {
    let (_, result) = common::run(
        file!(),
        common::only_on_root(6, vec![7.0]),
        |node: &mut Node| broadcast::broadcast_in_place(node, Strategy::Hypercube),
    );
    common::assert_failed_with(result, &[0, 1, 2, 3, 4, 5], &SimError::NotPowerOfTwo(6));
}

#[test]
fn broadcast_then_reduce() {
    let value = [4.5, -1.0];
    for strategy in Strategy::ALL {
        let mut data = vec![vec![0.0, 0.0]; 8];
        data[0] = value.to_vec();

        let (system, result) = common::run(file!(), data, move |node: &mut Node| -> SimResult {
            let local = node.data().to_vec();
            let received = broadcast::broadcast(node, local.clone(), strategy)?;
            if received != value {
                return sim_error!(format!("node{} received {:?}", node.id(), received));
            }
            let reduced = reduce::reduce(node, local, ops::sum, strategy)?;
            node.set_data(reduced);
            Ok(())
        });
        result.unwrap();
        assert_eq!(system.data(0).unwrap(), &value);
    }
}

#[test]
fn barrier_holds_every_node_until_all_arrive() {
    for strategy in Strategy::ALL {
        let size = 8;
        let started = Arc::new(AtomicUsize::new(0));
        let counter = started.clone();
        let (system, result) = common::run(
            file!(),
            common::only_on_root(size, vec![2.5]),
            move |node: &mut Node| -> SimResult {
                counter.fetch_add(1, Ordering::SeqCst);
                let local = node.data().to_vec();
                let received = broadcast::broadcast_with_barrier(node, local, strategy)?;
                let seen = counter.load(Ordering::SeqCst);
                if seen != size {
                    return sim_error!(format!("node{} left after {seen} nodes started", node.id()));
                }
                node.set_data(received);
                Ok(())
            },
        );
        result.unwrap();
        for i in 0..size {
            assert_eq!(system.data(i).unwrap(), &[2.5], "{strategy}");
        }
        assert_eq!(started.load(Ordering::SeqCst), size);
    }
}
