//! Allocation factors: split a share of business across candidates that compete on several
//! objectives, each of which is either minimized or maximized.
//!
//! ```
//! use allocation_factor::{construct, factor, FactorOptions, Senses};
//!
//! // Rows are objectives (capacity, cost), columns are vendors.
//! let problem = construct(
//!     [[10.0, 20.0, 30.0], [5.0, 3.0, 1.0]],
//!     Senses::from_ints(&[1, -1])?,
//! )?;
//! let result = factor(&problem, &FactorOptions::default())?;
//! assert_eq!(result.ranking(), vec![2, 1, 0]);
//! # Ok::<(), allocation_factor::AllocationError>(())
//! ```

pub mod aggregate;
pub mod allocation;
pub mod config;
pub mod error;
pub mod factors;
pub mod matrix;
pub mod model;
pub mod num;
pub mod outlier;

pub use crate::aggregate::{aggregate, Aggregation, Reduce, Reduction, TrimmedMean};
pub use crate::allocation::{factor, normalize, FactorOptions, FactorResult};
pub use crate::config::FactorConfig;
pub use crate::error::{AllocationError, Dimension, ErrorKind, Result};
pub use crate::factors::{beta, delta, DeltaOptions};
pub use crate::matrix::{
    construct, ObjectiveMatrix, PerObjective, Problem, Sense, SenseVector, Senses,
};
pub use crate::model::{
    Allocator, DeltaNonLinearOptimizer, LinearNdAllocation, SimpleLinearOptimizer,
};
pub use crate::num::Normalized;
