// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Dense row-major matrix blocks and the named per-node slots that hold them.

use std::fmt;

use crate::types::{SimError, SimResult};

/// Named storage for a block of a distributed matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
    C,
}

impl Slot {
    /// Number of slots held by each node.
    pub const COUNT: usize = 3;

    pub(crate) fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
            Slot::C => 2,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Slot::A => write!(f, "A"),
            Slot::B => write!(f, "B"),
            Slot::C => write!(f, "C"),
        }
    }
}

/// A dense row-major matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Block {
    /// Build a block from row-major `values`.
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> SimResult<Self> {
        if values.len() != rows * cols {
            return Err(SimError::LengthMismatch {
                left: rows * cols,
                right: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] = value;
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy out the `rows` x `cols` block whose top-left corner is at
    /// (`row`, `col`).
    #[must_use]
    pub fn submatrix(&self, row: usize, col: usize, rows: usize, cols: usize) -> Block {
        let mut values = Vec::with_capacity(rows * cols);
        for r in row..row + rows {
            values.extend_from_slice(&self.row(r)[col..col + cols]);
        }
        Block { rows, cols, values }
    }

    /// Copy `block` into this one with its top-left corner at (`row`, `col`).
    pub fn paste(&mut self, row: usize, col: usize, block: &Block) {
        for r in 0..block.rows {
            let start = (row + r) * self.cols + col;
            self.values[start..start + block.cols].copy_from_slice(block.row(r));
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for r in 0..self.rows {
            for value in self.row(r) {
                write!(f, "{value:8.2}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
