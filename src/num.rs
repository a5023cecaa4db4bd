use ordered_float::NotNan;

/// A non-NaN f64 value in the range [0, 1].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Normalized(NotNan<f64>);

impl Normalized {
    pub const ZERO: Self = Self(unsafe { NotNan::new_unchecked(0.0) });
    pub const ONE: Self = Self(unsafe { NotNan::new_unchecked(1.0) });

    pub fn new(value: f64) -> Option<Self> {
        let value = NotNan::new(value).ok()?;
        if value.is_sign_negative() || *value > 1.0 {
            return None;
        }
        Some(Self(value))
    }

    /// Clamp into [0, 1] first. Returns `None` only for NaN.
    pub fn saturating(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        Self::new(value.clamp(0.0, 1.0))
    }

    pub fn as_f64(&self) -> f64 {
        self.0.into_inner()
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }
}

impl std::ops::Mul for Normalized {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl std::cmp::PartialOrd for Normalized {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::cmp::Ord for Normalized {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::fmt::Debug for Normalized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Normalized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round half to even at `digits` decimal places. Digits beyond what an f64 can scale to leave the
/// value unchanged.
pub(crate) fn round_to_digits(value: f64, digits: u32) -> f64 {
    let Ok(exponent) = i32::try_from(digits) else {
        return value;
    };
    let scaled = value * 10_f64.powi(exponent);
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / 10_f64.powi(exponent)
}

/// Snap `value` to the nearest multiple of `grid`, ties to even multiples.
pub(crate) fn snap_to_grid(value: f64, grid: Normalized) -> f64 {
    let grid = grid.as_f64();
    grid * (value / grid).round_ties_even()
}
