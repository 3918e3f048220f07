// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use dsim_collectives::{Strategy, ops, reduce};
use dsim_engine::node::Node;
use dsim_engine::sim_error;
use dsim_engine::types::{SimError, SimResult};

mod common;

#[test]
fn sum_into_node_zero() {
    for strategy in Strategy::ALL {
        for size in common::POWERS_OF_TWO {
            let data = (0..size).map(|i| vec![i as f64, 1.0]).collect();
            let (system, result) = common::run(file!(), data, move |node: &mut Node| {
                reduce::reduce_in_place(node, ops::sum, strategy)
            });
            result.unwrap();

            let expected = (size * (size - 1) / 2) as f64;
            assert_eq!(
                system.data(0).unwrap(),
                &[expected, size as f64],
                "{strategy} N={size}"
            );
            assert_eq!(system.stats().messages(), (size - 1) as u64);
        }
    }
}

#[test]
fn other_operators() {
    let data: Vec<Vec<f64>> = [3.0, -2.0, 0.5, 4.0].iter().map(|v| vec![*v]).collect();
    for strategy in Strategy::ALL {
        let (system, result) = common::run(file!(), data.clone(), move |node: &mut Node| -> SimResult {
            let local = node.data().to_vec();
            let max = reduce::reduce(node, local.clone(), ops::max, strategy)?;
            let min = reduce::reduce(node, local.clone(), ops::min, strategy)?;
            let product = reduce::reduce(node, local, ops::product, strategy)?;
            node.set_data([max, min, product].concat());
            Ok(())
        });
        result.unwrap();

        let at_root = system.data(0).unwrap();
        assert_relative_eq!(at_root[0], 4.0);
        assert_relative_eq!(at_root[1], -2.0);
        assert_relative_eq!(at_root[2], -12.0);
    }
}

#[test]
fn operands_combined_in_node_order() {
    let first = |a: f64, _: f64| a;
    let last = |_: f64, b: f64| b;
    for strategy in Strategy::ALL {
        let data = (0..8).map(|i| vec![10.0 + i as f64]).collect();
        let (system, result) = common::run(file!(), data, move |node: &mut Node| -> SimResult {
            let local = node.data().to_vec();
            let leftmost = reduce::reduce(node, local.clone(), first, strategy)?;
            let rightmost = reduce::reduce(node, local, last, strategy)?;
            node.set_data([leftmost, rightmost].concat());
            Ok(())
        });
        result.unwrap();
        assert_eq!(system.data(0).unwrap(), &[10.0, 17.0], "{strategy}");
    }
}

#[test]
fn naive_works_for_any_size() {
    let (system, result) = common::run(file!(), common::ids_as_data(7), |node: &mut Node| {
        reduce::reduce_in_place(node, ops::sum, Strategy::Naive)
    });
    result.unwrap();
    assert_eq!(system.data(0).unwrap(), &[21.0]);
}

#[test]
fn all_reduce_reaches_every_node() {
    for strategy in Strategy::ALL {
        let (system, result) = common::run(file!(), common::ids_as_data(8), move |node: &mut Node| {
            reduce::all_reduce_in_place(node, ops::sum, strategy)
        });
        result.unwrap();
        for i in 0..8 {
            assert_eq!(system.data(i).unwrap(), &[28.0]);
        }
        assert_eq!(system.stats().messages(), 14);
    }
}

#[test]
fn mismatched_lengths_reported() {
    let mut data = common::ids_as_data(4);
    data[3] = vec![3.0, 3.0];
    let (_, result) = common::run(file!(), data, |node: &mut Node| {
        reduce::reduce_in_place(node, ops::sum, Strategy::Hypercube)
    });

    // node3 hands its two values to node2 in the first round
    common::assert_failed_with(
        result,
        &[2],
        &SimError::LengthMismatch { left: 1, right: 2 },
    );
}

#[test]
fn barrier_waits_for_the_whole_reduction() {
    for strategy in Strategy::ALL {
        let size = 4;
        let finished_reduce = Arc::new(AtomicUsize::new(0));
        let counter = finished_reduce.clone();
        let (system, result) = common::run(
            file!(),
            common::ids_as_data(size),
            move |node: &mut Node| -> SimResult {
                let local = node.data().to_vec();
                let reduced = reduce::reduce(node, local.clone(), ops::sum, strategy)?;
                counter.fetch_add(1, Ordering::SeqCst);

                let again = reduce::reduce_with_barrier(node, local, ops::sum, strategy)?;
                if node.id() == 0 && again != reduced {
                    return sim_error!(format!("second reduction gave {again:?}"));
                }
                let seen = counter.load(Ordering::SeqCst);
                if seen != size {
                    return sim_error!(format!("node{} left after {seen} reductions", node.id()));
                }
                node.set_data(again);
                Ok(())
            },
        );
        result.unwrap();
        assert_eq!(system.data(0).unwrap(), &[6.0], "{strategy}");
    }
}
