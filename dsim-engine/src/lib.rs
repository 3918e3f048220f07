// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! `dsim` - a distributed-system simulator.
//!
//! This library provides the runtime on which distributed algorithms are
//! executed: a fixed number of [nodes](crate::node::Node), each running the
//! same [program](crate::program::Program) on its own thread, connected by a
//! fully connected [network](crate::network) of synchronous (rendezvous)
//! channels with a configurable delay model.
//!
//! The collective communication algorithms built on top of it live in the
//! `dsim-collectives` crate.
//!
//! # Simple Application
//!
//! A very simple application would look like:
//!
//! ```rust
//! use dsim_engine::config::Config;
//! use dsim_engine::node::Node;
//! use dsim_engine::system::DistributedSystem;
//! use dsim_engine::types::SimResult;
//! use dsim_track::entity::toplevel;
//! use dsim_track::tracker::dev_null_tracker;
//!
//! let top = toplevel(&dev_null_tracker(), "top");
//! let initial = (0..4).map(|i| vec![i as f64]).collect();
//! let mut system = DistributedSystem::with_data(&top, &Config::with_nodes(4), initial).unwrap();
//!
//! // Pass each value one step around a ring
//! system.load_program(|node: &mut Node| -> SimResult {
//!     let right = (node.id() + 1) % node.size();
//!     let left = (node.id() + node.size() - 1) % node.size();
//!     if node.id() % 2 == 0 {
//!         node.send_data(right)?;
//!         node.receive_from_and_set(left)
//!     } else {
//!         let packet = node.receive_from(left)?;
//!         node.send_data(right)?;
//!         node.set_data(packet.into_payload());
//!         Ok(())
//!     }
//! });
//! system.run().unwrap();
//! assert_eq!(system.data(0).unwrap(), &[3.0]);
//! assert_eq!(system.data(1).unwrap(), &[0.0]);
//! ```

pub mod barrier;
pub mod block;
pub mod config;
pub mod network;
pub mod node;
pub mod packet;
pub mod program;
pub mod system;
pub mod test_helpers;
pub mod topology;
pub mod types;
