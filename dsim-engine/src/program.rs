// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The seam between the runtime and the software it runs.

use crate::node::Node;
use crate::types::SimResult;

/// Software that runs on every node of a system (SPMD).
///
/// The same program object is shared by all node threads; per-node state
/// belongs in the [`Node`].
pub trait Program: Send + Sync {
    fn run(&self, node: &mut Node) -> SimResult;
}

impl<F> Program for F
where
    F: Fn(&mut Node) -> SimResult + Send + Sync,
{
    fn run(&self, node: &mut Node) -> SimResult {
        self(node)
    }
}
