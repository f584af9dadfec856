use thiserror::Error;

use crate::precision::{MAX_PRECISION, MIN_PRECISION};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimatorError {
    #[error("precision {precision} is out of range [{}, {}]", MIN_PRECISION, MAX_PRECISION)]
    InvalidPrecision { precision: u8 },

    /// Merging estimators with different register counts is undefined.
    #[error("cannot merge estimators of different precision: expected {expected}, found {found}")]
    PrecisionMismatch { expected: u8, found: u8 },
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("failed to write sweep output: {0}")]
    Io(#[from] std::io::Error),

    #[error("sweep range is empty, max cardinality must be at least 1")]
    EmptyRange,
}
