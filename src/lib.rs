pub mod counters;
pub mod error;
pub mod parallel_counting;
pub mod precision;
pub mod sweep;

pub use counters::Counter;
pub use counters::HyperLogLog;
pub use error::{EstimatorError, SweepError};
pub use precision::Precision;
