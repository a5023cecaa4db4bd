use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

use super::reciprocal_or_zero;
use crate::{
    error::{AllocationError, Result},
    matrix::{Problem, Sense},
    num::round_to_digits,
};

/// Per-objective contribution of each candidate, before the product across objectives.
///
/// - maximize: `x - delta`, so values far above the baseline are damped rather than rewarded
///   without bound.
/// - minimize: `1 / (x + delta)`, so smaller raw values weigh more and volatility is penalized.
///   A zero denominator contributes 0.
pub fn contributions(problem: &Problem, delta: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let xs = problem.xs().view();
    if xs.dim() != delta.dim() {
        return Err(AllocationError::ShapeMismatch {
            expected: xs.dim(),
            found: delta.dim(),
        });
    }

    let mut clamped = 0_usize;
    let mut out = Array2::zeros(xs.dim());
    for (((mut row, x), d), sense) in out
        .outer_iter_mut()
        .zip(xs.outer_iter())
        .zip(delta.outer_iter())
        .zip(problem.senses().iter())
    {
        Zip::from(&mut row)
            .and(&x)
            .and(&d)
            .for_each(|c, &x, &d| match sense {
                Sense::Maximize => *c = x - d,
                Sense::Minimize => {
                    let denominator = x + d;
                    clamped += (denominator == 0.0) as usize;
                    *c = reciprocal_or_zero(denominator);
                }
            });
    }
    if clamped > 0 {
        tracing::debug!(clamped, "zero denominators in minimized objectives set to 0");
    }
    Ok(out)
}

/// Combined directional weight of each candidate: the product of its per-objective
/// [`contributions`], optionally rounded to `round_digits` decimal places.
pub fn beta(
    problem: &Problem,
    delta: ArrayView2<'_, f64>,
    round_digits: Option<u32>,
) -> Result<Array1<f64>> {
    let beta = contributions(problem, delta)?.map_axis(Axis(0), |column| column.product());
    Ok(match round_digits {
        Some(digits) => beta.mapv(|b| round_to_digits(b, digits)),
        None => beta,
    })
}
