use ndarray::{Array2, Axis};

use crate::{
    aggregate::Aggregation,
    error::{Dimension, Result},
    matrix::{PerObjective, Problem},
};

#[derive(Clone, Debug)]
pub struct DeltaOptions {
    /// Reduction producing each objective's baseline.
    pub aggregation: Aggregation,
    /// Keep the deviation magnitude only. When unset, the signed deviation propagates into beta.
    pub absolute: bool,
    /// Per-objective multiplier applied after the deviation is taken (penalty for minimized
    /// objectives, appreciation for maximized ones).
    pub scale: PerObjective<f64>,
}

impl Default for DeltaOptions {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::default(),
            absolute: true,
            scale: PerObjective::All(1.0),
        }
    }
}

/// Deviation of each candidate from its objective's baseline: `scale_i * |x_ij - f_i(x_i)|`.
/// The result has the same `(N, q)` shape as the objective matrix.
pub fn delta(problem: &Problem, options: &DeltaOptions) -> Result<Array2<f64>> {
    let xs = problem.xs();
    let baselines = options.aggregation.baselines(xs)?.insert_axis(Axis(1));
    let scale: Array2<f64> = {
        let scale = options
            .scale
            .resolve(xs.objectives(), Dimension::ScaleFactors)?;
        Array2::from_shape_fn((scale.len(), 1), |(i, _)| *scale[i])
    };

    let mut delta = &xs.view() - &baselines;
    if options.absolute {
        delta.mapv_inplace(f64::abs);
    }
    delta *= &scale;
    Ok(delta)
}

#[cfg(test)]
mod test {
    use ndarray::array;

    use super::*;
    use crate::{aggregate::Reduction, construct, AllocationError, Sense, Senses};

    fn problem() -> Problem {
        construct(
            [[10.0, 20.0, 30.0], [5.0, 3.0, 1.0]],
            Senses::from_ints(&[1, -1]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn absolute_deviation_from_mean() {
        let delta = delta(&problem(), &DeltaOptions::default()).unwrap();
        assert_eq!(delta, array![[10.0, 0.0, 10.0], [2.0, 0.0, 2.0]]);
    }

    #[test]
    fn signed_deviation_keeps_direction() {
        let options = DeltaOptions {
            absolute: false,
            ..Default::default()
        };
        let delta = delta(&problem(), &options).unwrap();
        assert_eq!(delta, array![[-10.0, 0.0, 10.0], [2.0, 0.0, -2.0]]);
    }

    #[test]
    fn scaled_per_objective() {
        let options = DeltaOptions {
            aggregation: Reduction::Min.into(),
            scale: vec![0.5, 2.0].into(),
            ..Default::default()
        };
        let delta = delta(&problem(), &options).unwrap();
        assert_eq!(delta, array![[0.0, 5.0, 10.0], [8.0, 4.0, 0.0]]);
    }

    #[test]
    fn scale_length_checked() {
        let options = DeltaOptions {
            scale: vec![1.0, 1.0, 1.0].into(),
            ..Default::default()
        };
        let err = delta(&problem(), &options).unwrap_err();
        assert_eq!(
            err,
            AllocationError::DimensionMismatch {
                what: Dimension::ScaleFactors,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn shape_matches_input() {
        let problem = construct([[1.0, 2.0, 3.0, 4.0]], Sense::Maximize).unwrap();
        let delta = delta(&problem, &DeltaOptions::default()).unwrap();
        assert_eq!(delta.dim(), (1, 4));
    }
}
