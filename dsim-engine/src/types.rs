// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::fmt;

use thiserror::Error;

/// Identifier of a node: an index in `[0, N)` for a system of `N` nodes.
pub type NodeId = usize;

// Simulation errors

#[macro_export]
/// Build a [SimError] from a message that supports `to_string`
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError::Other($msg.to_string()))
    };
}

/// The `SimError` is what should be returned in the case of an error
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimError {
    /// A node tried to send to or receive from itself.
    #[error("node {0} attempted to communicate with itself")]
    SelfCommunication(NodeId),

    /// A node tried to send an empty payload.
    #[error("node {0} attempted to send an empty payload")]
    NullPayload(NodeId),

    /// A hypercube algorithm was used with a node count that is not a power of
    /// two.
    #[error("{0} nodes is not a power of two")]
    NotPowerOfTwo(usize),

    /// A node id outside of the system was used.
    #[error("node {id} does not exist in a system of {nodes} nodes")]
    InvalidNode { id: NodeId, nodes: usize },

    /// A payload could not be split evenly.
    #[error("{len} values cannot be split evenly into {parts} parts")]
    IndivisiblePayload { len: usize, parts: usize },

    /// Two vectors of different lengths were combined.
    #[error("cannot combine vectors of length {left} and {right}")]
    LengthMismatch { left: usize, right: usize },

    /// The peer(s) a node was waiting on have closed their endpoints.
    #[error("node {node} lost its connection to {}", peer_name(.peer))]
    Disconnected { node: NodeId, peer: Option<NodeId> },

    /// Another node exited while this one was waiting at the barrier.
    #[error("node {0} found the system barrier broken")]
    BarrierBroken(NodeId),

    /// The program running on a node panicked.
    #[error("node {node} panicked: {msg}")]
    Panicked { node: NodeId, msg: String },

    /// `run()` was called before a program was loaded.
    #[error("no program loaded")]
    NoProgram,

    /// `run()` was called a second time on the same system.
    #[error("the system has already been run")]
    AlreadyRun,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// One or more nodes failed during `run()`.
    #[error("{} node(s) failed: {}", .0.len(), failure_list(.0))]
    NodesFailed(Vec<NodeFailure>),

    /// Any other error, usually built with [sim_error!](crate::sim_error).
    #[error("Error: {0}")]
    Other(String),
}

impl SimError {
    /// Errors that a node only sees because some other node stopped first.
    #[must_use]
    pub fn is_secondary(&self) -> bool {
        matches!(
            self,
            SimError::Disconnected { .. } | SimError::BarrierBroken(_)
        )
    }
}

fn peer_name(peer: &Option<NodeId>) -> String {
    match peer {
        Some(peer) => format!("node {peer}"),
        None => "all peers".to_string(),
    }
}

fn failure_list(failures: &[NodeFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The failure of one node during a run.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeFailure {
    /// Node that failed.
    pub node: NodeId,

    /// What its program returned.
    pub error: SimError,
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "node{}: {}", self.node, self.error)
    }
}

/// The SimResult is the return type for most simulation functions
pub type SimResult<T = ()> = Result<T, SimError>;
