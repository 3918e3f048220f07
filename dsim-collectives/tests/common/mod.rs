// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

#![allow(dead_code)]

use std::time::Duration;

use dsim_engine::config::Config;
use dsim_engine::program::Program;
use dsim_engine::system::DistributedSystem;
use dsim_engine::test_helpers::{run_with_watchdog, start_test};
use dsim_engine::types::{NodeFailure, SimError, SimResult};

/// Bound on how long any single test system may run.
pub const WATCHDOG: Duration = Duration::from_secs(20);

/// Node counts used when a collective must work for every power of two.
pub const POWERS_OF_TWO: [usize; 5] = [1, 2, 4, 8, 16];

/// Build a system from `data` (one entry per node), run `program` on it under
/// the watchdog and hand back the finished system.
pub fn run<P>(file: &str, data: Vec<Vec<f64>>, program: P) -> (DistributedSystem, SimResult)
where
    P: Program + 'static,
{
    let top = start_test(file);
    let mut system =
        DistributedSystem::with_data(&top, &Config::with_nodes(data.len()), data).unwrap();
    system.load_program(program);
    run_with_watchdog(system, WATCHDOG)
}

/// Node 0 holds `data`, every other node starts empty.
pub fn only_on_root(size: usize, data: Vec<f64>) -> Vec<Vec<f64>> {
    let mut all = vec![Vec::new(); size];
    all[0] = data;
    all
}

/// Node `i` holds `[i]`.
pub fn ids_as_data(size: usize) -> Vec<Vec<f64>> {
    (0..size).map(|i| vec![i as f64]).collect()
}

/// The failures of a run that was expected to fail.
pub fn failures(result: SimResult) -> Vec<NodeFailure> {
    match result {
        Err(SimError::NodesFailed(failures)) => failures,
        other => panic!("expected node failures, got {other:?}"),
    }
}

/// Assert that every listed node failed with `expected` as its own error.
pub fn assert_failed_with(result: SimResult, nodes: &[usize], expected: &SimError) {
    let failures = failures(result);
    for node in nodes {
        let failure = failures
            .iter()
            .find(|f| f.node == *node)
            .unwrap_or_else(|| panic!("node{node} did not fail"));
        assert_eq!(&failure.error, expected);
    }
}
