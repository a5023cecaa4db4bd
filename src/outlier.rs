//! Quartile-based trimming, applied to the objective matrix before the factor pipeline runs.

use crate::{
    error::Result,
    matrix::{ObjectiveMatrix, Problem},
};

/// Tukey's fence multiplier.
pub const DEFAULT_FENCE: f64 = 1.5;

/// Outcome of [`trim`].
#[derive(Clone, Debug, PartialEq)]
pub struct Trimmed {
    /// The objective matrix with every out-of-fence entry set to 0.
    pub xs: ObjectiveMatrix,
    /// Candidates with at least one out-of-fence entry, ascending.
    pub outliers: Vec<usize>,
}

/// Linear-interpolated quantile of an ascending slice, `q` in [0, 1].
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let (lo, hi) = (position.floor() as usize, position.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (position - lo as f64)
}

/// Zero every entry outside `[Q1 - fence * IQR, Q3 + fence * IQR]` of its objective row and report
/// the candidates that had one.
///
/// Zeroing alone does not remove a candidate: a zero cost has the largest reciprocal contribution.
/// Use [`trim_problem`] to also exclude the outliers from the allocation.
pub fn trim(xs: &ObjectiveMatrix, fence: f64) -> Result<Trimmed> {
    let mut trimmed = xs.clone().into_inner();
    let mut outliers = Vec::new();
    for mut row in trimmed.outer_iter_mut() {
        let mut sorted = row.to_vec();
        sorted.sort_unstable_by(f64::total_cmp);
        let (q1, q3) = (quantile(&sorted, 0.25), quantile(&sorted, 0.75));
        let iqr = q3 - q1;
        let (low, high) = (q1 - fence * iqr, q3 + fence * iqr);
        for (candidate, value) in row.iter_mut().enumerate() {
            if *value < low || *value > high {
                *value = 0.0;
                outliers.push(candidate);
            }
        }
    }
    outliers.sort_unstable();
    outliers.dedup();
    tracing::debug!(outliers = ?outliers, fence, "trimmed outliers");
    Ok(Trimmed {
        xs: ObjectiveMatrix::from_array(trimmed)?,
        outliers,
    })
}

/// [`trim`] the objective matrix of `problem`, keeping its senses, and exclude the outliers from
/// the allocation.
pub fn trim_problem(problem: Problem, fence: f64) -> Result<Problem> {
    let Trimmed { xs, outliers } = trim(problem.xs(), fence)?;
    problem.with_xs(xs)?.exclude(outliers)
}
