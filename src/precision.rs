use std::fmt;

use crate::error::EstimatorError;

pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 18;
pub const DEFAULT_PRECISION: u8 = 14;

/// Number of hash bits used to select a register.
///
/// Fixes the register count `m = 2^p` and the bias constant alpha for the
/// lifetime of an estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precision(u8);

impl Precision {
    pub fn new(p: u8) -> Result<Self, EstimatorError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&p) {
            tracing::debug!(precision = p, "rejected precision");
            return Err(EstimatorError::InvalidPrecision { precision: p });
        }
        Ok(Precision(p))
    }

    #[inline(always)]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub fn num_registers(self) -> usize {
        1 << self.0
    }

    /// Width of the field the rank is computed from.
    #[inline(always)]
    pub fn value_bits(self) -> u32 {
        64 - self.0 as u32
    }

    pub fn alpha(self) -> f64 {
        0.7213 / (1.0 + 1.079 / self.num_registers() as f64)
    }

    /// Theoretical relative standard error, `1.04 / sqrt(m)`.
    pub fn relative_error(self) -> f64 {
        1.04 / (self.num_registers() as f64).sqrt()
    }
}

impl Default for Precision {
    fn default() -> Self {
        Precision(DEFAULT_PRECISION)
    }
}

impl TryFrom<u8> for Precision {
    type Error = EstimatorError;

    fn try_from(p: u8) -> Result<Self, Self::Error> {
        Precision::new(p)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p={} (m={})", self.0, self.num_registers())
    }
}
