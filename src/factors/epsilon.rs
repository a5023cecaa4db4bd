use ndarray::{Array1, ArrayView1};

use crate::{
    aggregate::{reduce_lane, Reduce},
    error::{AllocationError, Result},
    matrix::ObjectiveMatrix,
};

/// Driver ratio of the reference objective: `f(x_r) / x_r` per candidate, i.e. how far below its
/// own baseline each candidate sits on the reference objective.
///
/// A zero reference value gives an infinite driver, which later divides the candidate's weight
/// down to zero.
pub fn driver<R: Reduce + ?Sized>(
    xs: &ObjectiveMatrix,
    reference: usize,
    method: &R,
) -> Result<Array1<f64>> {
    let row = xs.row(reference)?;
    let baseline = reduce_lane(method, row);
    Ok(row.mapv(|x| baseline / x))
}

/// Rescale `beta` onto the footing of the reference objective: `beta / driver`.
pub fn epsilon<R: Reduce + ?Sized>(
    xs: &ObjectiveMatrix,
    beta: ArrayView1<'_, f64>,
    reference: usize,
    method: &R,
) -> Result<Array1<f64>> {
    if beta.len() != xs.candidates() {
        return Err(AllocationError::ShapeMismatch {
            expected: (1, xs.candidates()),
            found: (1, beta.len()),
        });
    }
    Ok(&beta / &driver(xs, reference, method)?)
}
