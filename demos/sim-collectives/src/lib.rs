// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Run collective operations on a simulated distributed system and check
//! them against a sequential computation of the same result.
//!
//! Each [Scenario] is one collective, run with one strategy on a system of a
//! given size. Every node is seeded with random values (node 0 only for
//! broadcast and scatter), the collective is run in place with
//! [sum](dsim_collectives::ops::sum) as the operator and the data left on the
//! nodes is compared with what the collective should have produced.
//!
//! # Examples
//!
//! Run every collective with both strategies on the configured system size:
//! ```txt
//! cargo run --bin sim-collectives --release -- --stdout
//! ```
//!
//! Compare the strategies of one collective on 2, 4, ... 64 nodes with a
//! simulated connection cost:
//! ```txt
//! cargo run --bin sim-collectives --release -- --collective scan --power-series 6 \
//!     --connection-delay-us 50 --stdout
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use approx::relative_eq;
use dsim_collectives::{Collective, Strategy, ops};
use dsim_engine::config::Config;
use dsim_engine::node::Node;
use dsim_engine::system::DistributedSystem;
use dsim_engine::topology::is_power_of_two;
use dsim_engine::types::{SimError, SimResult};
use dsim_track::entity::Entity;
use rand::Rng;

/// One collective, run with one strategy on a system of a given size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub collective: Collective,
    pub strategy: Strategy,
    pub number_of_nodes: usize,
}

impl Scenario {
    /// Whether the collective can run with this strategy and system size.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !self.collective.needs_power_of_two(self.strategy) || is_power_of_two(self.number_of_nodes)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) on {} nodes",
            self.collective, self.strategy, self.number_of_nodes
        )
    }
}

/// Every combination of the given collectives, strategies and sizes.
#[must_use]
pub fn scenarios(
    collectives: &[Collective],
    strategies: &[Strategy],
    sizes: &[usize],
) -> Vec<Scenario> {
    let mut all = Vec::new();
    for &collective in collectives {
        for &number_of_nodes in sizes {
            for &strategy in strategies {
                all.push(Scenario {
                    collective,
                    strategy,
                    number_of_nodes,
                });
            }
        }
    }
    all
}

/// Random initial data for `collective` on `size` nodes.
///
/// Broadcast and scatter only read node 0, which holds `payload_len` values
/// (`payload_len` per node for scatter). Every other collective gets
/// `payload_len` values on every node.
pub fn seed_data<R: Rng>(
    collective: Collective,
    size: usize,
    payload_len: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let mut random = |len: usize| -> Vec<f64> { (0..len).map(|_| rng.gen_range(-10.0..10.0)).collect() };

    match collective {
        Collective::Broadcast | Collective::Scatter => {
            let len = if collective == Collective::Scatter {
                payload_len * size
            } else {
                payload_len
            };
            let mut data = vec![Vec::new(); size];
            data[0] = random(len);
            data
        }
        _ => (0..size).map(|_| random(payload_len)).collect(),
    }
}

/// What each node should hold after running `collective` on `initial`.
///
/// `None` marks nodes whose final data is not defined by the collective.
pub fn expected_results(
    collective: Collective,
    initial: &[Vec<f64>],
) -> SimResult<Vec<Option<Vec<f64>>>> {
    let size = initial.len();
    let only_root = |value: Vec<f64>| {
        let mut all = vec![None; size];
        all[0] = Some(value);
        all
    };

    let expected = match collective {
        Collective::Broadcast => vec![Some(initial[0].clone()); size],
        Collective::Reduce => only_root(running_sums(initial)?.pop().unwrap_or_default()),
        Collective::AllReduce => {
            vec![Some(running_sums(initial)?.pop().unwrap_or_default()); size]
        }
        Collective::Scatter => {
            let shard = initial[0].len() / size;
            initial[0]
                .chunks(shard.max(1))
                .map(|chunk| Some(chunk.to_vec()))
                .collect()
        }
        Collective::Gather => only_root(initial.concat()),
        Collective::Scan | Collective::ScanExchange => {
            running_sums(initial)?.into_iter().map(Some).collect()
        }
        Collective::AllToAll => vec![Some(initial.concat()); size],
    };
    Ok(expected)
}

/// Element-wise sums of `initial[..=i]` for every node `i`.
fn running_sums(initial: &[Vec<f64>]) -> SimResult<Vec<Vec<f64>>> {
    let mut prefixes: Vec<Vec<f64>> = Vec::with_capacity(initial.len());
    for data in initial {
        let prefix = match prefixes.last() {
            Some(last) => ops::combine(last, data, &ops::sum)?,
            None => data.clone(),
        };
        prefixes.push(prefix);
    }
    Ok(prefixes)
}

/// Compare the data left on the nodes of `system` with [expected_results].
///
/// Values are compared with a relative tolerance because the strategies add
/// in different groupings.
pub fn check_results(
    collective: Collective,
    initial: &[Vec<f64>],
    system: &DistributedSystem,
) -> SimResult {
    for (i, expected) in expected_results(collective, initial)?.into_iter().enumerate() {
        let Some(expected) = expected else {
            continue;
        };
        let actual = system.data(i)?;
        let matches = actual.len() == expected.len()
            && actual
                .iter()
                .zip(&expected)
                .all(|(a, e)| relative_eq!(*a, *e, epsilon = 1e-9, max_relative = 1e-9));
        if !matches {
            return Err(SimError::Other(format!(
                "node{i} holds {actual:?}, expected {expected:?}"
            )));
        }
    }
    Ok(())
}

/// Measurements of one run.
#[derive(Clone, Copy, Debug)]
pub struct Outcome {
    pub messages: u64,
    pub values: u64,
    pub elapsed: Duration,
}

/// Build a system for `scenario` from `config` and `initial`, run it and hand
/// it back with its measurements.
///
/// `config.number_of_nodes` is replaced by the size of the scenario.
pub fn simulate(
    parent: &Arc<Entity>,
    config: &Config,
    scenario: &Scenario,
    initial: Vec<Vec<f64>>,
) -> SimResult<(DistributedSystem, Outcome)> {
    let config = Config {
        number_of_nodes: scenario.number_of_nodes,
        ..config.clone()
    };
    let mut system = DistributedSystem::with_data(parent, &config, initial)?;

    let Scenario {
        collective,
        strategy,
        ..
    } = *scenario;
    system.load_program(move |node: &mut Node| collective.run_in_place(node, strategy));

    let start = Instant::now();
    system.run()?;
    let outcome = Outcome {
        messages: system.stats().messages(),
        values: system.stats().values(),
        elapsed: start.elapsed(),
    };
    Ok((system, outcome))
}
