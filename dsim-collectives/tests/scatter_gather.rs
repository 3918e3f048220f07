// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use dsim_collectives::{Strategy, broadcast, scatter};
use dsim_engine::node::Node;
use dsim_engine::types::{SimError, SimResult};

mod common;

fn one_to(n: usize) -> Vec<f64> {
    (1..=n).map(|v| v as f64).collect()
}

#[test]
fn each_node_gets_its_shard() {
    for strategy in Strategy::ALL {
        for size in common::POWERS_OF_TWO {
            let (system, result) = common::run(
                file!(),
                common::only_on_root(size, one_to(3 * size)),
                move |node: &mut Node| scatter::scatter_in_place(node, strategy),
            );
            result.unwrap();

            let mut rebuilt = Vec::new();
            for k in 0..size {
                let shard = system.data(k).unwrap();
                assert_eq!(shard, &one_to(3 * size)[3 * k..3 * k + 3], "{strategy} N={size}");
                rebuilt.extend_from_slice(shard);
            }
            assert_eq!(rebuilt, one_to(3 * size));
        }
    }
}

#[test]
fn scatter_gather_broadcast_round_trip() {
    for strategy in Strategy::ALL {
        let (system, result) = common::run(
            file!(),
            common::only_on_root(8, one_to(16)),
            move |node: &mut Node| -> SimResult {
                let data = node.data().to_vec();
                let shard = scatter::scatter(node, data, strategy)?;
                let expected = [2 * node.id() + 1, 2 * node.id() + 2].map(|v| v as f64);
                if shard != expected {
                    return Err(SimError::Other(format!("node{} got shard {:?}", node.id(), shard)));
                }

                let gathered = scatter::gather(node, shard, strategy)?;
                let full = broadcast::broadcast(node, gathered, strategy)?;
                node.set_data(full);
                Ok(())
            },
        );
        result.unwrap();
        for i in 0..8 {
            assert_eq!(system.data(i).unwrap(), one_to(16).as_slice(), "{strategy}");
        }
    }
}

#[test]
fn gather_keeps_node_order() {
    for strategy in Strategy::ALL {
        let (system, result) = common::run(file!(), common::ids_as_data(8), move |node: &mut Node| {
            scatter::gather_in_place(node, strategy)
        });
        result.unwrap();
        assert_eq!(
            system.data(0).unwrap(),
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]
        );
        assert_eq!(system.stats().messages(), 7);
    }
}

#[test]
fn naive_works_for_any_size() {
    let (system, result) = common::run(file!(), common::only_on_root(6, one_to(12)), |node: &mut Node| -> SimResult {
        scatter::scatter_in_place(node, Strategy::Naive)?;
        scatter::gather_in_place(node, Strategy::Naive)
    });
    result.unwrap();
    assert_eq!(system.data(0).unwrap(), one_to(12).as_slice());
    assert_eq!(system.data(5).unwrap(), &[11.0, 12.0]);
}

#[test]
fn payload_must_divide_evenly() {
    for strategy in Strategy::ALL {
        let (_, result) = common::run(file!(), common::only_on_root(4, one_to(6)), move |node: &mut Node| {
            scatter::scatter_in_place(node, strategy)
        });
        common::assert_failed_with(
            result,
            &[0],
            &SimError::IndivisiblePayload { len: 6, parts: 4 },
        );
    }
}

#[test]
fn empty_payload_rejected() {
    let (_, result) = common::run(file!(), vec![Vec::new(); 2], |node: &mut Node| {
        scatter::scatter_in_place(node, Strategy::Hypercube)
    });
    common::assert_failed_with(
        result,
        &[0],
        &SimError::IndivisiblePayload { len: 0, parts: 2 },
    );
}
