use std::{cmp::Reverse, sync::Arc};

use ndarray::{Array1, ArrayView1};
use ordered_float::NotNan;
use rand::seq::SliceRandom as _;

use crate::{
    aggregate::{DynReduce, Reduction},
    error::{AllocationError, Result},
    factors::{beta, delta, epsilon, DeltaOptions},
    matrix::Problem,
    num::{snap_to_grid, Normalized},
};

/// Raw weights below this are treated as exactly zero.
pub const NEGLIGIBLE: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct FactorOptions {
    pub delta: DeltaOptions,
    /// Round beta to this many decimal places before appreciation.
    pub round_digits: Option<u32>,
    /// Divide beta by the driver of the reference objective. When unset, the raw value is beta.
    pub appreciate: bool,
    /// Reference objective row for the driver.
    pub appreciate_index: usize,
    pub appreciate_method: DynReduce,
    /// Grid the rounded share snaps to, e.g. 0.05 for 5% steps.
    pub round_to: Normalized,
}

impl Default for FactorOptions {
    fn default() -> Self {
        Self {
            delta: DeltaOptions::default(),
            round_digits: None,
            appreciate: true,
            appreciate_index: 0,
            appreciate_method: Arc::new(Reduction::Mean),
            round_to: Normalized::new(0.05).unwrap_or(Normalized::ONE),
        }
    }
}

/// Outcome of [`factor`].
#[derive(Clone, Debug, PartialEq)]
pub struct FactorResult {
    /// Appreciated weight per candidate, with negligible values set to 0.
    pub raw: Array1<f64>,
    /// `raw / sum(raw)`: non-negative and sums to 1.
    pub share: Array1<f64>,
    /// `share` snapped to the rounding grid. This is for presentation and need not sum to 1.
    pub share_rounded: Array1<f64>,
}

impl FactorResult {
    pub fn candidates(&self) -> usize {
        self.share.len()
    }

    pub fn allocation(&self, candidate: usize) -> Option<Normalized> {
        self.share
            .get(candidate)
            .and_then(|&share| Normalized::saturating(share))
    }

    /// Candidate indices by descending share. Ties keep candidate order.
    pub fn ranking(&self) -> Vec<usize> {
        rank(self.share.view())
    }

    /// Pick one candidate at random, weighted by share. `None` only if no candidate has a share.
    pub fn choose<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let candidates: Vec<usize> = (0..self.candidates()).collect();
        candidates
            .choose_weighted(rng, |&candidate| self.share[candidate])
            .ok()
            .copied()
    }

    pub fn into_parts(self) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        (self.raw, self.share, self.share_rounded)
    }
}

/// Run the full pipeline: delta → beta → epsilon → finalize. Excluded candidates get no weight.
pub fn factor(problem: &Problem, options: &FactorOptions) -> Result<FactorResult> {
    if options.round_to.is_zero() {
        return Err(AllocationError::InvalidGrid(options.round_to.as_f64()));
    }
    if options.appreciate {
        problem.xs().row(options.appreciate_index)?;
    }

    let delta = delta(problem, &options.delta)?;
    let beta = beta(problem, delta.view(), options.round_digits)?;
    let raw = if options.appreciate {
        epsilon(
            problem.xs(),
            beta.view(),
            options.appreciate_index,
            options.appreciate_method.as_ref(),
        )?
    } else {
        beta
    };
    finalize(problem.mask(raw), options.round_to)
}

/// Clip negligible weights, then normalize and snap to the grid.
pub fn finalize(raw: Array1<f64>, round_to: Normalized) -> Result<FactorResult> {
    let mut clipped = 0_usize;
    // NaN from a zero baseline over a zero reference value fails the comparison and is clipped too.
    // +inf passes and is rejected by `normalize`.
    let raw = raw.mapv(|value| {
        if value >= NEGLIGIBLE {
            value
        } else {
            clipped += (value != 0.0) as usize;
            0.0
        }
    });
    if clipped > 0 {
        tracing::debug!(clipped, "negligible candidate weights set to 0");
    }

    let share = normalize(raw.view())?;
    let share_rounded = share.mapv(|share| snap_to_grid(share, round_to));
    Ok(FactorResult {
        raw,
        share,
        share_rounded,
    })
}

/// Divide by the total so the weights sum to 1. Every weight and the total must be finite.
pub fn normalize(weights: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    if let Some((candidate, &value)) = weights.indexed_iter().find(|(_, w)| !w.is_finite()) {
        return Err(AllocationError::NonFiniteWeight { candidate, value });
    }
    let total = weights.sum();
    if !total.is_finite() {
        return Err(AllocationError::WeightOverflow);
    }
    if total == 0.0 {
        return Err(AllocationError::DegenerateAllocation);
    }
    Ok(weights.mapv(|w| w / total))
}

/// Indices ordered by descending weight. NaN sorts last; ties keep index order.
pub fn rank(weights: ArrayView1<'_, f64>) -> Vec<usize> {
    let keys: Vec<Reverse<Option<NotNan<f64>>>> = weights
        .iter()
        .map(|&w| Reverse(NotNan::new(w).ok()))
        .collect();
    let order = permutation::sort(&keys[..]);
    order.apply_slice((0..keys.len()).collect::<Vec<usize>>())
}

#[cfg(test)]
mod test {
    use ndarray::array;
    use rand::{rngs::SmallRng, SeedableRng as _};

    use super::*;
    use crate::{construct, test::assert_within, ErrorKind, Sense, Senses};

    fn capacity_and_cost() -> Problem {
        construct(
            [[10.0, 20.0, 30.0], [5.0, 3.0, 1.0]],
            Senses::from_ints(&[1, -1]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn capacity_and_cost_without_appreciation() {
        let options = FactorOptions {
            appreciate: false,
            ..Default::default()
        };
        let result = factor(&capacity_and_cost(), &options).unwrap();
        assert_eq!(result.raw[0], 0.0);
        assert_within(result.raw[1], 20.0 / 3.0, 1e-12);
        assert_within(result.share[0], 0.0, 1e-12);
        assert_within(result.share[1], 0.5, 1e-12);
        assert_within(result.share[2], 0.5, 1e-12);
        for (rounded, expected) in result.share_rounded.iter().zip([0.0, 0.5, 0.5]) {
            assert_within(*rounded, expected, 1e-12);
        }
    }

    #[test]
    fn capacity_and_cost_appreciated_by_capacity() {
        // driver = 20 / [10, 20, 30], so the highest-capacity vendor gains.
        let result = factor(&capacity_and_cost(), &FactorOptions::default()).unwrap();
        assert_within(result.raw[1], 20.0 / 3.0, 1e-12);
        assert_within(result.raw[2], 10.0, 1e-12);
        assert_within(result.share[1], 0.4, 1e-12);
        assert_within(result.share[2], 0.6, 1e-12);
        assert_eq!(result.ranking(), vec![2, 1, 0]);
        assert_eq!(result.allocation(0), Some(Normalized::ZERO));
        assert_eq!(result.allocation(3), None);
    }

    #[test]
    fn rounded_share_need_not_sum_to_one() {
        let problem = construct([[1.0, 1.0, 1.0]], Sense::Maximize).unwrap();
        let result = factor(&problem, &FactorOptions::default()).unwrap();
        assert_within(result.share.sum(), 1.0, 1e-12);
        for share in &result.share_rounded {
            assert_within(*share, 0.35, 1e-12);
        }
        assert!((result.share_rounded.sum() - 1.0).abs() > 0.01);
    }

    #[test]
    fn every_candidate_suppressed() {
        // A single candidate sits on its own mean, so `x - delta` keeps it, but a cost of 0
        // zeroes the reciprocal.
        let problem = construct([[4.0], [0.0]], Senses::from_ints(&[1, -1]).unwrap()).unwrap();
        let err = factor(&problem, &FactorOptions::default()).unwrap_err();
        assert_eq!(err, AllocationError::DegenerateAllocation);
        assert_eq!(err.kind(), ErrorKind::DegenerateAllocation);
    }

    #[test]
    fn invalid_options_fail_before_computing() {
        let options = FactorOptions {
            appreciate_index: 5,
            ..Default::default()
        };
        let err = factor(&capacity_and_cost(), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOption);

        let options = FactorOptions {
            round_to: Normalized::ZERO,
            ..Default::default()
        };
        let err = factor(&capacity_and_cost(), &options).unwrap_err();
        assert_eq!(err, AllocationError::InvalidGrid(0.0));
    }

    #[test]
    fn zero_reference_baseline_is_rejected() {
        // The reference row averages to 0, so the driver is 0 and the first weight is infinite.
        let problem = construct([[-1.0, 1.0], [1.0, 2.0]], Sense::Maximize).unwrap();
        let err = factor(&problem, &FactorOptions::default()).unwrap_err();
        assert_eq!(
            err,
            AllocationError::NonFiniteWeight {
                candidate: 0,
                value: f64::INFINITY
            }
        );
        assert_eq!(err.kind(), ErrorKind::DegenerateAllocation);
    }

    #[test]
    fn overflowing_product_is_rejected() {
        let problem = construct([[1e200, 1e200], [1e200, 2e200]], Sense::Maximize).unwrap();
        let options = FactorOptions {
            appreciate: false,
            ..Default::default()
        };
        let err = factor(&problem, &options).unwrap_err();
        assert!(matches!(err, AllocationError::NonFiniteWeight { candidate: 0, .. }));

        let err = normalize(array![f64::MAX, f64::MAX].view()).unwrap_err();
        assert_eq!(err, AllocationError::WeightOverflow);
        assert_eq!(err.kind(), ErrorKind::DegenerateAllocation);
    }

    #[test]
    fn excess_round_digits_are_a_no_op() {
        let options = FactorOptions {
            round_digits: Some(400),
            appreciate: false,
            ..Default::default()
        };
        let result = factor(&capacity_and_cost(), &options).unwrap();
        assert_within(result.share[0], 0.0, 1e-12);
        assert_within(result.share[1], 0.5, 1e-12);
        assert_within(result.share[2], 0.5, 1e-12);
    }

    #[test]
    fn negligible_and_negative_weights_clipped() {
        let result = finalize(array![1e-12, -3.0, 2.0, 2.0], Normalized::ONE).unwrap();
        assert_eq!(result.raw, array![0.0, 0.0, 2.0, 2.0]);
        assert_eq!(result.share, array![0.0, 0.0, 0.5, 0.5]);
        assert!(result.share.iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn rank_orders_descending() {
        assert_eq!(rank(array![0.2, f64::NAN, 0.5, 0.2].view()), vec![2, 0, 3, 1]);
    }

    #[test]
    fn choose_follows_share() {
        let result = finalize(array![0.0, 1.0, 3.0], Normalized::ONE).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut counts = [0_u32; 3];
        for _ in 0..4000 {
            counts[result.choose(&mut rng).unwrap()] += 1;
        }
        assert_eq!(counts[0], 0);
        assert_within(counts[2] as f64 / 4000.0, 0.75, 0.05);
    }
}
