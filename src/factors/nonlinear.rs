//! The description-only deviation factor. Unlike [`beta`](super::beta), the deviation is added
//! back onto the base value for every objective and minimized objectives are inverted afterwards.

use ndarray::{Array1, Axis};

use super::reciprocal_or_zero;
use crate::{
    aggregate::Aggregation,
    error::Result,
    matrix::{Problem, Sense},
};

#[derive(Clone, Debug)]
pub struct NonlinearOptions {
    pub aggregation: Aggregation,
    pub absolute: bool,
    /// Use `x + |x - f(x)|` rather than the bare deviation.
    pub addon_base: bool,
    /// Invert minimized objectives.
    pub reciprocal: bool,
}

impl Default for NonlinearOptions {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::default(),
            absolute: true,
            addon_base: true,
            reciprocal: true,
        }
    }
}

pub fn delta(problem: &Problem, options: &NonlinearOptions) -> Result<Array1<f64>> {
    let xs = problem.xs().view();
    let baselines = options
        .aggregation
        .baselines(problem.xs())?
        .insert_axis(Axis(1));

    let mut factors = &xs - &baselines;
    if options.absolute {
        factors.mapv_inplace(f64::abs);
    }
    if options.addon_base {
        factors += &xs;
    }
    if options.reciprocal {
        for (mut row, sense) in factors.outer_iter_mut().zip(problem.senses().iter()) {
            if sense == Sense::Minimize {
                row.mapv_inplace(reciprocal_or_zero);
            }
        }
    }
    Ok(factors.map_axis(Axis(0), |column| column.product()))
}
