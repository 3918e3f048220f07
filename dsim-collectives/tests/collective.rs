// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use dsim_collectives::{Collective, Strategy};
use dsim_engine::node::Node;

mod common;

/// Node `i` holds `len` copies of `i`.
fn seed(size: usize, len: usize) -> Vec<Vec<f64>> {
    (0..size).map(|i| vec![i as f64; len]).collect()
}

#[test]
fn every_collective_runs_in_place() {
    for collective in Collective::ALL {
        for strategy in Strategy::ALL {
            let (system, result) = common::run(file!(), seed(8, 8), move |node: &mut Node| {
                collective.run_in_place(node, strategy)
            });
            result.unwrap_or_else(|e| panic!("{collective} with {strategy}: {e}"));

            let at_root = system.data(0).unwrap().to_vec();
            let expected: Vec<f64> = match collective {
                Collective::Broadcast | Collective::Scan | Collective::ScanExchange => {
                    vec![0.0; 8]
                }
                Collective::Reduce | Collective::AllReduce => vec![28.0; 8],
                Collective::Scatter => vec![0.0],
                Collective::Gather | Collective::AllToAll => {
                    (0..8).flat_map(|i| vec![i as f64; 8]).collect()
                }
            };
            assert_eq!(at_root, expected, "{collective} with {strategy}");
        }
    }
}

#[test]
fn naive_strategies_run_on_any_size() {
    for collective in Collective::ALL {
        if collective.needs_power_of_two(Strategy::Naive) {
            continue;
        }
        let (_, result) = common::run(file!(), seed(4, 4), move |node: &mut Node| {
            collective.run_in_place(node, Strategy::Naive)
        });
        result.unwrap_or_else(|e| panic!("{collective}: {e}"));

        let (_, result) = common::run(file!(), seed(6, 12), move |node: &mut Node| {
            collective.run_in_place(node, Strategy::Naive)
        });
        result.unwrap_or_else(|e| panic!("{collective} on 6 nodes: {e}"));
    }
}
