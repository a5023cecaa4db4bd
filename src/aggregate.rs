use std::sync::Arc;

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Dimension, Result},
    matrix::{ObjectiveMatrix, PerObjective},
};

/// A reduction of one lane of values to a single summary value, e.g. a mean. Any
/// `Fn(&[f64]) -> f64` is a reduction, so custom statistics can be passed as closures.
pub trait Reduce {
    fn reduce(&self, values: &[f64]) -> f64;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Reduce for F
where
    F: Fn(&[f64]) -> f64,
{
    fn reduce(&self, values: &[f64]) -> f64 {
        self(values)
    }
}

/// Built-in reductions. An empty lane reduces to NaN.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    #[default]
    Mean,
    Median,
    Min,
    Max,
}

impl Reduce for Reduction {
    fn reduce(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_unstable_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// Mean after cutting `proportion` of the values from each end of the sorted lane. At most 0.5 is
/// cut, and the middle value (or pair) always survives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimmedMean {
    pub proportion: f64,
}

impl Reduce for TrimmedMean {
    fn reduce(&self, values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_unstable_by(f64::total_cmp);
        let cut = (self.proportion.clamp(0.0, 0.5) * sorted.len() as f64) as usize;
        // Keep at least one value, two for an even-length lane.
        let cut = cut.min(sorted.len().saturating_sub(1) / 2);
        let kept = &sorted[cut..sorted.len() - cut];
        Reduction::Mean.reduce(kept)
    }

    fn name(&self) -> &str {
        "trimmed_mean"
    }
}

pub type DynReduce = Arc<dyn Reduce + Send + Sync>;

impl std::fmt::Debug for dyn Reduce + Send + Sync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reduce one lane, copying it only when it is not contiguous.
pub fn reduce_lane<R: Reduce + ?Sized>(reduction: &R, lane: ArrayView1<'_, f64>) -> f64 {
    match lane.as_slice() {
        Some(values) => reduction.reduce(values),
        None => reduction.reduce(&lane.to_vec()),
    }
}

/// Apply `reduction` to every lane along `axis`. For an `(N, q)` objective matrix, `Axis(1)`
/// yields one value per objective and `Axis(0)` one value per candidate.
pub fn aggregate<R: Reduce + ?Sized>(
    values: ArrayView2<'_, f64>,
    reduction: &R,
    axis: Axis,
) -> Array1<f64> {
    values.map_axis(axis, |lane| reduce_lane(reduction, lane))
}

/// Which reduction produces the baseline of each objective: one shared reduction, or one per
/// objective row.
pub type Aggregation = PerObjective<DynReduce>;

impl Aggregation {
    pub fn uniform<R: Reduce + Send + Sync + 'static>(reduction: R) -> Self {
        Self::All(Arc::new(reduction))
    }

    pub fn per_objective<I, R>(reductions: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Reduce + Send + Sync + 'static,
    {
        Self::Each(
            reductions
                .into_iter()
                .map(|r| Arc::new(r) as DynReduce)
                .collect(),
        )
    }

    /// Baseline value of every objective row.
    pub fn baselines(&self, xs: &ObjectiveMatrix) -> Result<Array1<f64>> {
        match self {
            Self::All(reduction) => Ok(aggregate(xs.view(), reduction.as_ref(), Axis(1))),
            Self::Each(_) => {
                let reductions = self.resolve(xs.objectives(), Dimension::Reductions)?;
                Ok(xs
                    .view()
                    .outer_iter()
                    .zip(reductions)
                    .map(|(row, reduction)| reduce_lane(reduction.as_ref(), row))
                    .collect())
            }
        }
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Self::uniform(Reduction::Mean)
    }
}

impl From<Reduction> for Aggregation {
    fn from(reduction: Reduction) -> Self {
        Self::uniform(reduction)
    }
}

impl From<Vec<Reduction>> for Aggregation {
    fn from(reductions: Vec<Reduction>) -> Self {
        Self::per_objective(reductions)
    }
}
