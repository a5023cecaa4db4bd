use ndarray::{Array1, Axis};

use super::reciprocal_or_zero;
use crate::matrix::{Problem, Sense};

/// The plain multiplicative factor: the product over objectives of `x` when maximizing and `1 / x`
/// when minimizing. Equivalent to [`beta`](super::beta) with a zero delta.
pub fn alpha(problem: &Problem) -> Array1<f64> {
    let mut oriented = problem.xs().view().to_owned();
    for (mut row, sense) in oriented.outer_iter_mut().zip(problem.senses().iter()) {
        if sense == Sense::Minimize {
            row.mapv_inplace(reciprocal_or_zero);
        }
    }
    oriented.map_axis(Axis(0), |column| column.product())
}
