/// Which per-objective specification failed to line up with the objective count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Senses,
    Reductions,
    ScaleFactors,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Senses => "senses",
            Self::Reductions => "reductions",
            Self::ScaleFactors => "scale factors",
        };
        f.write_str(name)
    }
}

/// Broad classes of failure. Numeric degeneracies that have a defined outcome (zero denominators,
/// negligible weights) are clamped by the pipeline and never show up here. Weights that cannot be
/// normalized, because they are all zero or not finite, are `DegenerateAllocation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Shape,
    DimensionMismatch,
    DegenerateAllocation,
    InvalidOption,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("objective matrix must have at least one objective and one candidate")]
    Empty,

    #[error("ragged objective matrix: row {row} has {found} candidates, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("non-numeric entry {value:?} at row {row}, column {column}")]
    NonNumeric {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("non-finite entry {value} at row {row}, column {column}")]
    NonFinite { row: usize, column: usize, value: f64 },

    #[error("expected a {expected:?} matrix, got {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("expected {expected} {what} (one per objective), got {found}")]
    DimensionMismatch {
        what: Dimension,
        expected: usize,
        found: usize,
    },

    #[error("invalid sense {0}: use -1 to minimize or +1 to maximize")]
    InvalidSense(i64),

    #[error("objective index {index} out of range for {objectives} objectives")]
    ObjectiveOutOfRange { index: usize, objectives: usize },

    #[error("candidate index {index} out of range for {candidates} candidates")]
    CandidateOutOfRange { index: usize, candidates: usize },

    #[error("rounding grid must be in (0, 1], got {0}")]
    InvalidGrid(f64),

    #[error("degenerate allocation: every candidate weight collapsed to zero")]
    DegenerateAllocation,

    #[error("candidate {candidate} has non-finite weight {value}")]
    NonFiniteWeight { candidate: usize, value: f64 },

    #[error("candidate weights overflow when summed")]
    WeightOverflow,
}

impl AllocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Empty
            | Self::Ragged { .. }
            | Self::NonNumeric { .. }
            | Self::NonFinite { .. }
            | Self::ShapeMismatch { .. } => ErrorKind::Shape,
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::DegenerateAllocation
            | Self::NonFiniteWeight { .. }
            | Self::WeightOverflow => ErrorKind::DegenerateAllocation,
            Self::InvalidSense(_)
            | Self::ObjectiveOutOfRange { .. }
            | Self::CandidateOutOfRange { .. }
            | Self::InvalidGrid(_) => ErrorKind::InvalidOption,
        }
    }
}

pub type Result<T, E = AllocationError> = std::result::Result<T, E>;
