// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Arrangements of node ids: hypercubes and 2D meshes.

use crate::types::{NodeId, SimError, SimResult};

#[must_use]
pub fn is_power_of_two(n: usize) -> bool {
    n.is_power_of_two()
}

/// Dimension `d` of the hypercube with `n = 2^d` nodes.
pub fn hypercube_dimension(n: usize) -> SimResult<u32> {
    if !is_power_of_two(n) {
        return Err(SimError::NotPowerOfTwo(n));
    }
    Ok(n.trailing_zeros())
}

/// Neighbour of `id` across dimension `bit` of a hypercube.
#[must_use]
pub fn hypercube_partner(id: NodeId, bit: u32) -> NodeId {
    id ^ (1 << bit)
}

/// A row-major 2D mesh of nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mesh {
    pub rows: usize,
    pub cols: usize,
}

impl Mesh {
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// The square mesh holding exactly `n` nodes.
    pub fn square(n: usize) -> SimResult<Self> {
        let side = n.isqrt();
        if side == 0 || side * side != n {
            return crate::sim_error!(format!("{n} nodes cannot form a square mesh"));
        }
        Ok(Self::new(side, side))
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    #[must_use]
    pub fn coords_to_id(&self, row: usize, col: usize) -> NodeId {
        row * self.cols + col
    }

    #[must_use]
    pub fn row_of(&self, id: NodeId) -> usize {
        id / self.cols
    }

    #[must_use]
    pub fn col_of(&self, id: NodeId) -> usize {
        id % self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions() {
        assert_eq!(hypercube_dimension(1), Ok(0));
        assert_eq!(hypercube_dimension(2), Ok(1));
        assert_eq!(hypercube_dimension(64), Ok(6));
        assert_eq!(hypercube_dimension(0), Err(SimError::NotPowerOfTwo(0)));
        assert_eq!(hypercube_dimension(6), Err(SimError::NotPowerOfTwo(6)));
    }

    #[test]
    fn partners() {
        assert_eq!(hypercube_partner(5, 0), 4);
        assert_eq!(hypercube_partner(5, 1), 7);
        assert_eq!(hypercube_partner(5, 2), 1);
    }

    #[test]
    fn mesh_coordinates() {
        let mesh = Mesh::new(2, 3);
        assert_eq!(mesh.size(), 6);
        for id in 0..mesh.size() {
            assert_eq!(mesh.coords_to_id(mesh.row_of(id), mesh.col_of(id)), id);
        }
        assert_eq!(mesh.coords_to_id(1, 2), 5);
        assert_eq!(mesh.row_of(4), 1);
        assert_eq!(mesh.col_of(4), 1);
    }

    #[test]
    fn square_mesh() {
        assert_eq!(Mesh::square(9), Ok(Mesh::new(3, 3)));
        assert!(Mesh::square(8).is_err());
        assert!(Mesh::square(0).is_err());
    }
}
