use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{aggregate, Reduce},
    error::{AllocationError, Dimension, Result},
};

/// Direction of optimization for one objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Sense {
    pub fn sign(self) -> f64 {
        match self {
            Self::Minimize => -1.0,
            Self::Maximize => 1.0,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Self::Minimize => Self::Maximize,
            Self::Maximize => Self::Minimize,
        }
    }
}

impl TryFrom<i64> for Sense {
    type Error = AllocationError;
    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Self::Minimize),
            1 => Ok(Self::Maximize),
            other => Err(AllocationError::InvalidSense(other)),
        }
    }
}

impl From<Sense> for i64 {
    fn from(sense: Sense) -> Self {
        match sense {
            Sense::Minimize => -1,
            Sense::Maximize => 1,
        }
    }
}

/// Either a single value broadcast to every objective, or exactly one value per objective.
#[derive(Clone, Debug, PartialEq)]
pub enum PerObjective<T> {
    All(T),
    Each(Vec<T>),
}

impl<T> PerObjective<T> {
    /// Expand to one entry per objective. An `Each` list of the wrong length is rejected rather
    /// than truncated or padded.
    pub fn resolve(&self, objectives: usize, what: Dimension) -> Result<Vec<&T>> {
        match self {
            Self::All(value) => Ok(vec![value; objectives]),
            Self::Each(values) if values.len() == objectives => Ok(values.iter().collect()),
            Self::Each(values) => Err(AllocationError::DimensionMismatch {
                what,
                expected: objectives,
                found: values.len(),
            }),
        }
    }
}

pub type Senses = PerObjective<Sense>;

impl Senses {
    /// Interpret integer senses, e.g. `[1, -1]`, as one sense per objective.
    pub fn from_ints(values: &[i64]) -> Result<Self> {
        values
            .iter()
            .map(|&v| Sense::try_from(v))
            .collect::<Result<Vec<Sense>>>()
            .map(Self::Each)
    }
}

impl From<Sense> for Senses {
    fn from(sense: Sense) -> Self {
        Self::All(sense)
    }
}

impl From<Vec<Sense>> for Senses {
    fn from(senses: Vec<Sense>) -> Self {
        Self::Each(senses)
    }
}

impl<const N: usize> From<[Sense; N]> for Senses {
    fn from(senses: [Sense; N]) -> Self {
        Self::Each(senses.to_vec())
    }
}

impl From<f64> for PerObjective<f64> {
    fn from(value: f64) -> Self {
        Self::All(value)
    }
}

impl From<Vec<f64>> for PerObjective<f64> {
    fn from(values: Vec<f64>) -> Self {
        Self::Each(values)
    }
}

/// Dense `(N, q)` matrix: one row per objective, one column per candidate. All entries are finite.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectiveMatrix(Array2<f64>);

impl ObjectiveMatrix {
    pub fn from_rows<Rows, Row>(rows: Rows) -> Result<Self>
    where
        Rows: IntoIterator<Item = Row>,
        Row: IntoIterator<Item = f64>,
    {
        let rows: Vec<Vec<f64>> = rows
            .into_iter()
            .map(|row| row.into_iter().collect())
            .collect();
        let candidates = rows.first().map(Vec::len).unwrap_or(0);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != candidates {
                return Err(AllocationError::Ragged {
                    row,
                    expected: candidates,
                    found: values.len(),
                });
            }
            if let Some((column, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite())
            {
                return Err(AllocationError::NonFinite { row, column, value });
            }
        }
        if rows.is_empty() || candidates == 0 {
            return Err(AllocationError::Empty);
        }
        Ok(Self(Array2::from_shape_fn(
            (rows.len(), candidates),
            |(i, j)| rows[i][j],
        )))
    }

    /// Parse textual cells, e.g. fields of a CSV record. Anything that is not a number is a
    /// [`AllocationError::NonNumeric`] naming the cell.
    pub fn parse_rows<Rows, Row, Cell>(rows: Rows) -> Result<Self>
    where
        Rows: IntoIterator<Item = Row>,
        Row: IntoIterator<Item = Cell>,
        Cell: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .into_iter()
                    .enumerate()
                    .map(|(column, cell)| {
                        let cell = cell.as_ref().trim();
                        cell.parse::<f64>()
                            .map_err(|_| AllocationError::NonNumeric {
                                row,
                                column,
                                value: cell.to_string(),
                            })
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;
        Self::from_rows(rows)
    }

    pub fn from_array(xs: Array2<f64>) -> Result<Self> {
        if xs.is_empty() {
            return Err(AllocationError::Empty);
        }
        if let Some(((row, column), &value)) = xs.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(AllocationError::NonFinite { row, column, value });
        }
        Ok(Self(xs))
    }

    /// Swap the axes, for callers holding one row per candidate.
    pub fn from_candidate_rows<Rows, Row>(rows: Rows) -> Result<Self>
    where
        Rows: IntoIterator<Item = Row>,
        Row: IntoIterator<Item = f64>,
    {
        let Self(xs) = Self::from_rows(rows)?;
        Ok(Self(xs.reversed_axes().as_standard_layout().into_owned()))
    }

    /// N
    pub fn objectives(&self) -> usize {
        self.0.nrows()
    }

    /// q
    pub fn candidates(&self) -> usize {
        self.0.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    pub fn row(&self, objective: usize) -> Result<ArrayView1<'_, f64>> {
        if objective >= self.objectives() {
            return Err(AllocationError::ObjectiveOutOfRange {
                index: objective,
                objectives: self.objectives(),
            });
        }
        Ok(self.0.row(objective))
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.0
    }
}

/// Validated per-objective senses, one per row of the matching [`ObjectiveMatrix`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenseVector(Vec<Sense>);

impl SenseVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sense> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Sense] {
        &self.0
    }

    /// `(N, 1)` column of ±1, for broadcasting against the `(N, q)` objective matrix.
    pub fn column(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.0.len(), 1), |(i, _)| self.0[i].sign())
    }
}

/// A validated allocation problem: objective matrix, matching senses, and the candidates excluded
/// from the allocation (e.g. by outlier trimming).
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    xs: ObjectiveMatrix,
    senses: SenseVector,
    excluded: Vec<usize>,
}

impl Problem {
    pub fn new(xs: ObjectiveMatrix, senses: impl Into<Senses>) -> Result<Self> {
        let senses = senses
            .into()
            .resolve(xs.objectives(), Dimension::Senses)?
            .into_iter()
            .copied()
            .collect();
        tracing::debug!(
            objectives = xs.objectives(),
            candidates = xs.candidates(),
            "validated allocation problem"
        );
        Ok(Self {
            xs,
            senses: SenseVector(senses),
            excluded: Vec::new(),
        })
    }

    pub fn xs(&self) -> &ObjectiveMatrix {
        &self.xs
    }

    pub fn senses(&self) -> &SenseVector {
        &self.senses
    }

    /// Candidates whose weight is forced to 0, ascending.
    pub fn excluded(&self) -> &[usize] {
        &self.excluded
    }

    /// N
    pub fn objectives(&self) -> usize {
        self.xs.objectives()
    }

    /// q
    pub fn candidates(&self) -> usize {
        self.xs.candidates()
    }

    /// Reduce the objective matrix along `axis`: `Axis(1)` gives one value per objective,
    /// `Axis(0)` one value per candidate.
    pub fn describe<R: Reduce + ?Sized>(&self, reduction: &R, axis: Axis) -> Array1<f64> {
        aggregate(self.xs.view(), reduction, axis)
    }

    /// Replace the objective matrix, keeping the senses. The new matrix must have the same number
    /// of objectives. Exclusions are kept only while the candidate count is unchanged.
    pub fn with_xs(self, xs: ObjectiveMatrix) -> Result<Self> {
        if xs.objectives() != self.senses.len() {
            return Err(AllocationError::DimensionMismatch {
                what: Dimension::Senses,
                expected: xs.objectives(),
                found: self.senses.len(),
            });
        }
        let excluded = if xs.candidates() == self.candidates() {
            self.excluded
        } else {
            Vec::new()
        };
        Ok(Self {
            xs,
            senses: self.senses,
            excluded,
        })
    }

    /// Exclude `candidates` from the allocation, on top of any earlier exclusions.
    pub fn exclude(mut self, candidates: impl IntoIterator<Item = usize>) -> Result<Self> {
        for candidate in candidates {
            if candidate >= self.candidates() {
                return Err(AllocationError::CandidateOutOfRange {
                    index: candidate,
                    candidates: self.candidates(),
                });
            }
            self.excluded.push(candidate);
        }
        self.excluded.sort_unstable();
        self.excluded.dedup();
        Ok(self)
    }

    /// Zero the weight of every excluded candidate.
    pub fn mask(&self, mut weights: Array1<f64>) -> Array1<f64> {
        for &candidate in &self.excluded {
            if let Some(weight) = weights.get_mut(candidate) {
                *weight = 0.0;
            }
        }
        weights
    }

    pub fn into_parts(self) -> (ObjectiveMatrix, SenseVector, usize, usize) {
        let (n, q) = (self.objectives(), self.candidates());
        (self.xs, self.senses, n, q)
    }
}

/// Validate a raw table of objective rows and a sense specification in one step.
pub fn construct<Rows, Row>(xs: Rows, senses: impl Into<Senses>) -> Result<Problem>
where
    Rows: IntoIterator<Item = Row>,
    Row: IntoIterator<Item = f64>,
{
    Problem::new(ObjectiveMatrix::from_rows(xs)?, senses)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{aggregate::Reduction, ErrorKind};
    use ndarray::array;

    #[test]
    fn scalar_sense_broadcasts() {
        let xs = [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let scalar = construct(xs, Sense::try_from(-1).unwrap()).unwrap();
        let vector = construct(xs, Senses::from_ints(&[-1, -1, -1]).unwrap()).unwrap();
        assert_eq!(scalar, vector);
        assert_eq!(scalar.senses().column(), array![[-1.0], [-1.0], [-1.0]]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let xs = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]];
        let err = construct(xs, Sense::Maximize).unwrap_err();
        assert_eq!(
            err,
            AllocationError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            }
        );
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn sense_length_mismatch_rejected() {
        let xs = [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let err = construct(xs, Senses::from_ints(&[1, -1]).unwrap()).unwrap_err();
        assert_eq!(
            err,
            AllocationError::DimensionMismatch {
                what: Dimension::Senses,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn invalid_entries_rejected() {
        assert_eq!(
            Sense::try_from(0).unwrap_err(),
            AllocationError::InvalidSense(0)
        );
        let err = ObjectiveMatrix::parse_rows([["1", "2"], ["3", "four"]]).unwrap_err();
        assert_eq!(
            err,
            AllocationError::NonNumeric {
                row: 1,
                column: 1,
                value: "four".into()
            }
        );
        let err = ObjectiveMatrix::from_rows([[1.0, f64::NAN]]).unwrap_err();
        assert!(matches!(err, AllocationError::NonFinite { row: 0, column: 1, .. }));
        let empty: Vec<Vec<f64>> = vec![];
        assert_eq!(
            ObjectiveMatrix::from_rows(empty).unwrap_err(),
            AllocationError::Empty
        );
    }

    #[test]
    fn dimensions_and_describe() {
        let problem = construct([[10.0, 20.0, 30.0], [5.0, 3.0, 1.0]], Sense::Maximize).unwrap();
        assert_eq!(problem.objectives(), 2);
        assert_eq!(problem.candidates(), 3);
        assert_eq!(
            problem.describe(&Reduction::Mean, Axis(1)),
            array![20.0, 3.0]
        );
        assert_eq!(
            problem.describe(&Reduction::Max, Axis(0)),
            array![10.0, 20.0, 30.0]
        );
        let (xs, senses, n, q) = problem.into_parts();
        assert_eq!((n, q), (2, 3));
        assert_eq!(xs.row(1).unwrap(), array![5.0, 3.0, 1.0]);
        assert_eq!(senses.len(), 2);
    }

    #[test]
    fn exclusions_mask_weights() {
        let problem = construct([[1.0, 2.0, 3.0]], Sense::Maximize)
            .unwrap()
            .exclude([2, 0, 2])
            .unwrap();
        assert_eq!(problem.excluded(), &[0, 2]);
        assert_eq!(problem.mask(array![1.0, 2.0, 3.0]), array![0.0, 2.0, 0.0]);

        let err = problem.clone().exclude([3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOption);

        let same = ObjectiveMatrix::from_rows([[4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(problem.clone().with_xs(same).unwrap().excluded(), &[0, 2]);
        let fewer = ObjectiveMatrix::from_rows([[4.0, 5.0]]).unwrap();
        assert!(problem.with_xs(fewer).unwrap().excluded().is_empty());
    }

    #[test]
    fn candidate_rows_are_transposed() {
        let xs = ObjectiveMatrix::from_candidate_rows([[10.0, 5.0], [20.0, 3.0], [30.0, 1.0]])
            .unwrap();
        assert_eq!(xs.view(), array![[10.0, 20.0, 30.0], [5.0, 3.0, 1.0]]);
    }
}
