// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use dsim_collectives::{Strategy, all_to_all};
use dsim_engine::config::Config;
use dsim_engine::node::Node;
use dsim_engine::system::DistributedSystem;
use dsim_engine::test_helpers::run_with_watchdog;
use dsim_engine::types::SimResult;
use dsim_track::entity::toplevel;
use dsim_track::test_init;

mod common;

fn tagged(size: usize) -> Vec<Vec<f64>> {
    (0..size)
        .map(|i| vec![10.0 * i as f64, 10.0 * i as f64 + 1.0])
        .collect()
}

#[test]
fn every_node_gets_everything() {
    for strategy in Strategy::ALL {
        for size in [1, 2, 3, 4, 5, 8] {
            let (system, result) = common::run(file!(), tagged(size), move |node: &mut Node| {
                all_to_all::all_to_all_in_place(node, strategy)
            });
            result.unwrap();

            let everything = tagged(size).concat();
            for i in 0..size {
                assert_eq!(system.data(i).unwrap(), everything.as_slice(), "{strategy} N={size}");
            }
        }
    }
}

#[test]
fn result_indexed_by_source() {
    let (system, result) = common::run(file!(), tagged(4), |node: &mut Node| -> SimResult {
        let data = node.data().to_vec();
        let all = all_to_all::all_to_all(node, data, Strategy::Hypercube)?;
        node.set_data(all.iter().map(|from| from[0]).collect());
        Ok(())
    });
    result.unwrap();
    for i in 0..4 {
        assert_eq!(system.data(i).unwrap(), &[0.0, 10.0, 20.0, 30.0]);
    }
}

#[test]
fn ring_covers_every_pair() {
    for size in [4, 6, 7] {
        let (test_tracker, tracker) = test_init!(1);
        let top = toplevel(&tracker, "top");
        let mut system =
            DistributedSystem::with_data(&top, &Config::with_nodes(size), tagged(size)).unwrap();
        system.load_program(|node: &mut Node| {
            all_to_all::all_to_all_in_place(node, Strategy::Hypercube)
        });

        let (system, result) = run_with_watchdog(system, common::WATCHDOG);
        result.unwrap();
        assert_eq!(system.stats().messages(), (size * (size - 1)) as u64);

        for i in 0..size {
            let node_id = test_tracker
                .entity_id(&format!("top::system::node{i}"))
                .unwrap();
            for source in (0..size).filter(|s| *s != i) {
                let pattern =
                    format!("^{node_id}:TRACE: ring round \\d+ receives data of node{source}$");
                assert_eq!(test_tracker.count_matching(&pattern), 1, "node{i} from node{source}");
            }

            // Round r brings the data of the node r + 1 places to the left.
            let rounds: Vec<String> = test_tracker
                .lines_by(node_id)
                .into_iter()
                .filter(|line| line.contains("ring round"))
                .collect();
            let expected: Vec<String> = (0..size - 1)
                .map(|r| {
                    let source = (i + size - r - 1) % size;
                    format!("{node_id}:TRACE: ring round {r} receives data of node{source}")
                })
                .collect();
            assert_eq!(rounds, expected, "node{i}");
        }
    }
}
