//! Pixel-wise arithmetic over tile buffers.
//!
//! Binary operations combine two tiles and use a [`ValidRange`] to decide
//! which pixels take part; scalar operations mutate a tile in place and skip
//! pixels holding the fill value.

pub mod binary;
pub mod remap;
pub mod scalar;

/// Arithmetic operator shared by the binary and scalar kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// Apply in floating point. Callers screen out zero divisors.
    #[inline]
    pub fn apply_f64(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Add => x + y,
            Self::Sub => x - y,
            Self::Mul => x * y,
            Self::Div => x / y,
        }
    }

    /// Apply in 64-bit integer arithmetic, saturating at the `i64` range and
    /// truncating division toward zero. Callers screen out zero divisors.
    #[inline]
    pub fn apply_i64(self, x: i64, y: i64) -> i64 {
        match self {
            Self::Add => x.saturating_add(y),
            Self::Sub => x.saturating_sub(y),
            Self::Mul => x.saturating_mul(y),
            Self::Div => x.checked_div(y).unwrap_or(0),
        }
    }
}

/// Inclusive interval of raw pixel values that take part in a computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Every value except NaN.
    pub fn all() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// NaN is never contained.
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}
