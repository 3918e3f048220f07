// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Operators used to combine the data of different nodes.
//!
//! Operators act on single values and are applied element-wise to vectors by
//! [`combine`]. The collectives always pass the contribution of the lower node
//! ids as the left operand, so any associative operator gives the same answer
//! whichever [`Strategy`](crate::Strategy) is used.

use dsim_engine::types::{SimError, SimResult};

pub fn sum(a: f64, b: f64) -> f64 {
    a + b
}

pub fn product(a: f64, b: f64) -> f64 {
    a * b
}

pub fn min(a: f64, b: f64) -> f64 {
    a.min(b)
}

pub fn max(a: f64, b: f64) -> f64 {
    a.max(b)
}

/// Combine two equal-length vectors element by element.
pub fn combine<F>(left: &[f64], right: &[f64], op: &F) -> SimResult<Vec<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    if left.len() != right.len() {
        return Err(SimError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(left.iter().zip(right).map(|(&a, &b)| op(a, b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_wise() {
        assert_eq!(
            combine(&[1.0, 5.0], &[3.0, 2.0], &sum),
            Ok(vec![4.0, 7.0])
        );
        assert_eq!(
            combine(&[1.0, 5.0], &[3.0, 2.0], &max),
            Ok(vec![3.0, 5.0])
        );
        assert_eq!(
            combine(&[1.0, 5.0], &[3.0, 2.0], &min),
            Ok(vec![1.0, 2.0])
        );
        assert_eq!(
            combine(&[2.0], &[4.0], &product),
            Ok(vec![8.0])
        );
    }

    #[test]
    fn operand_order_kept() {
        let first = |a: f64, _: f64| a;
        assert_eq!(combine(&[1.0], &[2.0], &first), Ok(vec![1.0]));
    }

    #[test]
    fn lengths_must_match() {
        assert_eq!(
            combine(&[1.0], &[1.0, 2.0], &sum),
            Err(SimError::LengthMismatch { left: 1, right: 2 })
        );
    }
}
