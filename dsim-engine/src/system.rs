// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The orchestrator of a simulated distributed system.
//!
//! # Example
//!
//! ```rust
//! use dsim_engine::config::Config;
//! use dsim_engine::system::DistributedSystem;
//! use dsim_track::entity::toplevel;
//! use dsim_track::tracker::dev_null_tracker;
//!
//! let top = toplevel(&dev_null_tracker(), "top");
//! let mut system = DistributedSystem::new(&top, &Config::with_nodes(2)).unwrap();
//! system.set_data(0, vec![42.0]).unwrap();
//! system.load_program(|node: &mut dsim_engine::node::Node| {
//!     if node.id() == 0 {
//!         node.send_data(1)
//!     } else {
//!         node.receive_from_and_set(0)
//!     }
//! });
//! system.run().unwrap();
//! assert_eq!(system.data(1).unwrap(), &[42.0]);
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;

use dsim_track::entity::Entity;
use dsim_track::{debug, error, info, warn};

use crate::barrier::Barrier;
use crate::block::{Block, Slot};
use crate::config::Config;
use crate::network::{DelayModel, Network, NetworkStats};
use crate::node::Node;
use crate::program::Program;
use crate::topology::Mesh;
use crate::types::{NodeFailure, NodeId, SimError, SimResult};

/// A set of nodes joined by a network, all running the same program.
pub struct DistributedSystem {
    pub entity: Arc<Entity>,
    config: Config,
    nodes: Vec<Node>,
    stats: Arc<NetworkStats>,
    program: Option<Arc<dyn Program>>,
    has_run: bool,
}

impl DistributedSystem {
    /// Create a system whose nodes start without data.
    pub fn new(parent: &Arc<Entity>, config: &Config) -> SimResult<Self> {
        Self::with_data(parent, config, vec![Vec::new(); config.number_of_nodes])
    }

    /// Create a system with initial data for every node.
    pub fn with_data(
        parent: &Arc<Entity>,
        config: &Config,
        initial_data: Vec<Vec<f64>>,
    ) -> SimResult<Self> {
        config.validate()?;
        if initial_data.len() != config.number_of_nodes {
            return Err(SimError::Config(format!(
                "initial data for {} nodes given to a system of {} nodes",
                initial_data.len(),
                config.number_of_nodes
            )));
        }

        let entity = Entity::new(parent, "system");
        let network = Network::new(config.number_of_nodes, DelayModel::from_config(config))?;
        let stats = network.stats();
        let barrier = Arc::new(Barrier::new(config.number_of_nodes));

        let nodes: Vec<Node> = network
            .into_endpoints()
            .into_iter()
            .zip(initial_data)
            .map(|(endpoint, data)| Node::new(&entity, endpoint, barrier.clone(), data))
            .collect();

        debug!(entity ; "created {} nodes", nodes.len());

        Ok(Self {
            entity,
            config: config.clone(),
            nodes,
            stats,
            program: None,
            has_run: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Traffic counters of the network.
    #[must_use]
    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> SimResult<&Node> {
        let nodes = self.nodes.len();
        self.nodes
            .get(id)
            .ok_or(SimError::InvalidNode { id, nodes })
    }

    pub fn node_mut(&mut self, id: NodeId) -> SimResult<&mut Node> {
        let nodes = self.nodes.len();
        self.nodes
            .get_mut(id)
            .ok_or(SimError::InvalidNode { id, nodes })
    }

    pub fn data(&self, id: NodeId) -> SimResult<&[f64]> {
        Ok(self.node(id)?.data())
    }

    pub fn set_data(&mut self, id: NodeId, data: Vec<f64>) -> SimResult {
        self.node_mut(id)?.set_data(data);
        Ok(())
    }

    /// Load the program that every node will run.
    pub fn load_program<P>(&mut self, program: P)
    where
        P: Program + 'static,
    {
        self.program = Some(Arc::new(program));
    }

    /// Run the loaded program on every node and wait for all of them.
    ///
    /// Each node runs on its own thread (`node{i}`). A node that returns, fails
    /// or panics closes its endpoint and breaks the barrier, so peers still
    /// waiting on it fail rather than hang. All failures are returned together.
    pub fn run(&mut self) -> SimResult {
        if self.has_run {
            return Err(SimError::AlreadyRun);
        }
        let Some(program) = self.program.clone() else {
            return Err(SimError::NoProgram);
        };
        self.has_run = true;

        info!(self.entity ; "running {} nodes", self.nodes.len());

        let mut failures: Vec<NodeFailure> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.nodes.len());
            let mut failures = Vec::new();

            for node in &mut self.nodes {
                let id = node.id();
                let program = program.clone();
                let guard = LeaveOnDrop { node };
                let spawned = thread::Builder::new()
                    .name(format!("node{id}"))
                    .spawn_scoped(scope, move || run_node(guard, program.as_ref()));
                match spawned {
                    Ok(handle) => handles.push((id, handle)),
                    Err(e) => failures.push(NodeFailure {
                        node: id,
                        error: SimError::Other(format!("unable to start thread: {e}")),
                    }),
                }
            }

            for (id, handle) in handles {
                let result = match handle.join() {
                    Ok(result) => result,
                    Err(panic) => Err(SimError::Panicked {
                        node: id,
                        msg: panic_message(&*panic),
                    }),
                };
                if let Err(error) = result {
                    failures.push(NodeFailure { node: id, error });
                }
            }
            failures
        });

        if failures.is_empty() {
            info!(self.entity ; "all nodes finished");
            return Ok(());
        }

        failures.sort_by_key(|failure| failure.node);
        for failure in &failures {
            if failure.error.is_secondary() {
                warn!(self.entity ; "{}", failure);
            } else {
                error!(self.entity ; "{}", failure);
            }
        }
        Err(SimError::NodesFailed(failures))
    }

    /// Split `matrix` into equal blocks over `mesh` and store block (r, c) in
    /// `slot` of the node at mesh position (r, c).
    pub fn scatter_matrix(&mut self, matrix: &Block, slot: Slot, mesh: Mesh) -> SimResult {
        self.check_mesh(mesh)?;
        if matrix.rows() % mesh.rows != 0 {
            return Err(SimError::IndivisiblePayload {
                len: matrix.rows(),
                parts: mesh.rows,
            });
        }
        if matrix.cols() % mesh.cols != 0 {
            return Err(SimError::IndivisiblePayload {
                len: matrix.cols(),
                parts: mesh.cols,
            });
        }

        let block_rows = matrix.rows() / mesh.rows;
        let block_cols = matrix.cols() / mesh.cols;
        for (id, node) in self.nodes.iter_mut().enumerate() {
            let row = mesh.row_of(id) * block_rows;
            let col = mesh.col_of(id) * block_cols;
            node.set_slot(slot, matrix.submatrix(row, col, block_rows, block_cols));
        }
        Ok(())
    }

    /// Reassemble the matrix distributed over `mesh` in `slot`.
    pub fn collect_matrix(&self, slot: Slot, mesh: Mesh) -> SimResult<Block> {
        self.check_mesh(mesh)?;
        let Some(first) = self.nodes[0].slot(slot) else {
            return crate::sim_error!(format!("node 0 has no block in slot {slot}"));
        };
        let (block_rows, block_cols) = (first.rows(), first.cols());

        let mut matrix = Block::zeros(mesh.rows * block_rows, mesh.cols * block_cols);
        for (id, node) in self.nodes.iter().enumerate() {
            let Some(block) = node.slot(slot) else {
                return crate::sim_error!(format!("node {id} has no block in slot {slot}"));
            };
            if block.rows() != block_rows || block.cols() != block_cols {
                return Err(SimError::LengthMismatch {
                    left: block_rows * block_cols,
                    right: block.values().len(),
                });
            }
            matrix.paste(mesh.row_of(id) * block_rows, mesh.col_of(id) * block_cols, block);
        }
        Ok(matrix)
    }

    fn check_mesh(&self, mesh: Mesh) -> SimResult {
        if mesh.size() != self.nodes.len() {
            return crate::sim_error!(format!(
                "a {}x{} mesh does not cover {} nodes",
                mesh.rows,
                mesh.cols,
                self.nodes.len()
            ));
        }
        Ok(())
    }
}

impl fmt::Display for DistributedSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Data in the system of nodes:")?;
        for node in &self.nodes {
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

/// Owns a node for the lifetime of its thread.
///
/// Dropping it (normal return, error, panic or a thread that never started)
/// takes the node out of the system.
struct LeaveOnDrop<'a> {
    node: &'a mut Node,
}

impl Drop for LeaveOnDrop<'_> {
    fn drop(&mut self) {
        self.node.close();
    }
}

fn run_node(mut guard: LeaveOnDrop, program: &dyn Program) -> SimResult {
    let node = &mut *guard.node;
    let id = node.id();
    debug!(node.entity ; "start");

    let result = match catch_unwind(AssertUnwindSafe(|| program.run(node))) {
        Ok(result) => result,
        Err(panic) => Err(SimError::Panicked {
            node: id,
            msg: panic_message(&*panic),
        }),
    };

    match &result {
        Ok(()) => {
            debug!(node.entity ; "done");
        }
        Err(e) => {
            debug!(node.entity ; "failed: {}", e);
        }
    }
    drop(guard);
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
