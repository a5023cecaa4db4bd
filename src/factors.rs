//! Per-candidate factors derived from a validated [`Problem`](crate::Problem).
//!
//! Objectives are combined with a product, in the manner of the
//! [weighted product model](https://en.wikipedia.org/wiki/Weighted_product_model): a candidate
//! that scores near zero on any single objective is strongly suppressed overall, regardless of how
//! well it does on the others.

pub mod alpha;
pub mod beta;
pub mod delta;
pub mod epsilon;
pub mod nonlinear;

pub use alpha::alpha;
pub use beta::{beta, contributions};
pub use delta::{delta, DeltaOptions};
pub use epsilon::{driver, epsilon};

/// `1 / value`, except that a zero denominator contributes nothing instead of an infinity.
pub(crate) fn reciprocal_or_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value.recip()
    }
}
