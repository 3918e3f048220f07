// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Collective communication algorithms for the dsim runtime.
//!
//! Every collective is called by all nodes of a
//! [DistributedSystem](dsim_engine::system::DistributedSystem) from within the
//! same program. Each algorithm comes in two [Strategy]s that give the same
//! result:
//!
//!  - [Strategy::Hypercube] completes in `log2(N)` rounds, one dimension of
//!    the hypercube per round. It needs the number of nodes to be a power of
//!    two (except for [all_to_all](all_to_all::all_to_all), which uses a ring).
//!  - [Strategy::Naive] routes everything through node 0 (or along a chain)
//!    in `N-1` steps and works with any number of nodes.
//!
//! Operators are always applied with the contribution of the lower node ids
//! on the left.
//!
//! # Examples
//!
//! ```rust
//! use dsim_collectives::{Strategy, ops, reduce};
//! use dsim_engine::config::Config;
//! use dsim_engine::node::Node;
//! use dsim_engine::system::DistributedSystem;
//! use dsim_engine::types::SimResult;
//! use dsim_track::entity::toplevel;
//! use dsim_track::tracker::dev_null_tracker;
//!
//! # fn main() -> SimResult {
//! let top = toplevel(&dev_null_tracker(), "top");
//! let data = (0..8).map(|i| vec![i as f64]).collect();
//! let mut system = DistributedSystem::with_data(&top, &Config::with_nodes(8), data)?;
//!
//! system.load_program(|node: &mut Node| -> SimResult {
//!     reduce::reduce_in_place(node, ops::sum, Strategy::Hypercube)
//! });
//! system.run()?;
//!
//! assert_eq!(system.data(0)?, &[28.0]);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use dsim_engine::node::Node;
use dsim_engine::types::SimResult;

pub mod all_to_all;
pub mod broadcast;
pub mod exchange;
pub mod ops;
pub mod reduce;
pub mod scan;
pub mod scatter;

/// How a collective is carried out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    #[default]
    Hypercube,
    Naive,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Hypercube, Strategy::Naive];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Hypercube => write!(f, "hypercube"),
            Strategy::Naive => write!(f, "naive"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hypercube" => Ok(Strategy::Hypercube),
            "naive" => Ok(Strategy::Naive),
            _ => Err(format!("unknown strategy '{s}' (expected hypercube or naive)")),
        }
    }
}

/// Names every collective so harnesses can select one at run time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collective {
    Broadcast,
    Reduce,
    Scatter,
    Gather,
    Scan,
    ScanExchange,
    AllToAll,
    AllReduce,
}

impl Collective {
    pub const ALL: [Collective; 8] = [
        Collective::Broadcast,
        Collective::Reduce,
        Collective::Scatter,
        Collective::Gather,
        Collective::Scan,
        Collective::ScanExchange,
        Collective::AllToAll,
        Collective::AllReduce,
    ];

    /// Whether this collective needs a power-of-two number of nodes when run
    /// with `strategy`.
    #[must_use]
    pub fn needs_power_of_two(self, strategy: Strategy) -> bool {
        match self {
            Collective::ScanExchange => true,
            Collective::AllToAll => false,
            _ => strategy == Strategy::Hypercube,
        }
    }

    /// Run the collective on the node's local data, combining with
    /// [ops::sum] where an operator is needed.
    ///
    /// [Collective::ScanExchange] only has a hypercube form and ignores
    /// `strategy`.
    pub fn run_in_place(self, node: &mut Node, strategy: Strategy) -> SimResult {
        match self {
            Collective::Broadcast => broadcast::broadcast_in_place(node, strategy),
            Collective::Reduce => reduce::reduce_in_place(node, ops::sum, strategy),
            Collective::Scatter => scatter::scatter_in_place(node, strategy),
            Collective::Gather => scatter::gather_in_place(node, strategy),
            Collective::Scan => scan::scan_in_place(node, ops::sum, strategy),
            Collective::ScanExchange => scan::scan_exchange_in_place(node, ops::sum),
            Collective::AllToAll => all_to_all::all_to_all_in_place(node, strategy),
            Collective::AllReduce => reduce::all_reduce_in_place(node, ops::sum, strategy),
        }
    }
}

impl fmt::Display for Collective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collective::Broadcast => "broadcast",
            Collective::Reduce => "reduce",
            Collective::Scatter => "scatter",
            Collective::Gather => "gather",
            Collective::Scan => "scan",
            Collective::ScanExchange => "scan-exchange",
            Collective::AllToAll => "all-to-all",
            Collective::AllReduce => "all-reduce",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Collective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collective::ALL
            .into_iter()
            .find(|c| c.to_string() == s)
            .ok_or_else(|| format!("unknown collective '{s}'"))
    }
}
