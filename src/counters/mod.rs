pub mod counter_base;
pub mod hll_counter;

pub use counter_base::Counter;
pub use hll_counter::HyperLogLog;
