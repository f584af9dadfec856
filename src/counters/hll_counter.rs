use crate::counters::Counter;
use crate::error::EstimatorError;
use crate::precision::Precision;
use std::fmt;
use std::hash::BuildHasher;
use xxhash_rust::xxh64::Xxh64Builder;

/// Returns the register selected by the top `p` bits of `hash`.
#[inline(always)]
pub fn register_index(hash: u64, precision: Precision) -> usize {
    (hash >> precision.value_bits()) as usize
}

/// Returns the low `64 - p` bits of `hash`, the field the rank is taken from.
#[inline(always)]
pub fn register_value(hash: u64, precision: Precision) -> u64 {
    hash & ((1u64 << precision.value_bits()) - 1)
}

/// Counts zero bits from the top of the `64 - p` bit value field down to the
/// first set bit. A zero value yields the full field width.
#[inline(always)]
pub fn leading_zeros(value: u64, precision: Precision) -> u32 {
    // the field sits in the low bits, so the top p bits of the word are
    // always zero and must not be counted
    register_value(value, precision).leading_zeros() - precision.bits() as u32
}

/// A HyperLogLog cardinality estimator with `2^p` one-byte registers.
///
/// `S` supplies the 64-bit hash for every added item. Estimators only merge
/// exactly when they hash identically; the default is xxh64 with seed 0.
///
/// The estimator is single-owner: `add` and `merge` take `&mut self`, so
/// concurrent counting is done by building one estimator per shard and
/// merging them (see [`crate::parallel_counting`]).
#[derive(Clone)]
pub struct HyperLogLog<S = Xxh64Builder> {
    precision: Precision,
    alpha: f64,
    registers: Vec<u8>,
    hasher: S,
}

impl HyperLogLog<Xxh64Builder> {
    /// Creates an empty estimator with the default precision (`p = 14`).
    pub fn new() -> Self {
        Self::with_precision(Precision::default())
    }

    pub fn with_precision(precision: Precision) -> Self {
        Self::with_hasher(precision, Xxh64Builder::default())
    }
}

impl<S> HyperLogLog<S> {
    pub fn with_hasher(precision: Precision, hasher: S) -> Self {
        HyperLogLog {
            precision,
            alpha: precision.alpha(),
            registers: vec![u8::MIN; precision.num_registers()],
            hasher,
        }
    }

    #[inline(always)]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    #[inline(always)]
    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn zero_registers(&self) -> usize {
        self.registers.iter().filter(|&&reg| reg == 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.iter().all(|&reg| reg == 0)
    }

    /// Applies the register update rule to an already computed hash.
    ///
    /// Returns `true` if a register was raised.
    #[inline(always)]
    pub fn add_hash(&mut self, hash: u64) -> bool {
        let index = register_index(hash, self.precision);
        let rank = (leading_zeros(register_value(hash, self.precision), self.precision) + 1) as u8;

        if rank > self.registers[index] {
            self.registers[index] = rank;
            return true;
        }
        false
    }

    /// Estimated number of distinct items added so far.
    ///
    /// Falls back to linear counting while the raw estimate is at most
    /// `2.5 * m` and some register is still empty. There is no large-range
    /// correction: with a 64-bit hash the saturation regime it targets is out
    /// of reach for realistic inputs, so it is left out rather than guessed.
    pub fn estimate(&self) -> f64 {
        let num_registers = self.registers.len() as f64;

        let (sum, zeros) = self
            .registers
            .iter()
            .fold((0f64, 0usize), |(sum, zeros), &reg| {
                (sum + 2f64.powi(-(reg as i32)), zeros + (reg == 0) as usize)
            });

        let mut estimate = self.alpha * num_registers * num_registers / sum;

        if estimate <= 2.5 * num_registers && zeros > 0 {
            estimate = num_registers * (num_registers / zeros as f64).ln();
        }

        estimate
    }

    /// Folds `other` into `self` by taking the register-wise maximum.
    ///
    /// Afterwards `self` holds exactly the registers of an estimator fed with
    /// both input streams. `self` is unchanged if the precisions differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), EstimatorError> {
        if self.precision != other.precision {
            tracing::debug!(
                expected = self.precision.bits(),
                found = other.precision.bits(),
                "refusing to merge estimators"
            );
            return Err(EstimatorError::PrecisionMismatch {
                expected: self.precision.bits(),
                found: other.precision.bits(),
            });
        }

        for (reg_self, reg_other) in self.registers.iter_mut().zip(other.registers.iter()) {
            *reg_self = std::cmp::max(*reg_self, *reg_other);
        }
        tracing::trace!(precision = self.precision.bits(), "merged estimator");
        Ok(())
    }

    /// Resets every register to zero.
    pub fn clear(&mut self) {
        self.registers.fill(0);
    }
}

impl<S: BuildHasher> Counter for HyperLogLog<S> {
    fn add(&mut self, item: &[u8]) {
        let hash = self.hasher.hash_one(item);
        self.add_hash(hash);
    }

    fn estimate(&self) -> f64 {
        HyperLogLog::estimate(self)
    }
}

impl<S: BuildHasher + Default> Default for HyperLogLog<S> {
    fn default() -> Self {
        Self::with_hasher(Precision::default(), S::default())
    }
}

impl<S, T> PartialEq<HyperLogLog<T>> for HyperLogLog<S> {
    fn eq(&self, other: &HyperLogLog<T>) -> bool {
        self.precision == other.precision && self.registers == other.registers
    }
}

impl<S> fmt::Debug for HyperLogLog<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperLogLog")
            .field("precision", &self.precision.bits())
            .field("num_registers", &self.registers.len())
            .field("zero_registers", &self.zero_registers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    const ALL_VALUE_BITS: u64 = 1_125_899_906_842_623; // 2^50 - 1

    fn build(items: &[String]) -> HyperLogLog {
        let mut hll = HyperLogLog::new();
        for item in items {
            hll.add(item.as_bytes());
        }
        hll
    }

    #[test]
    fn test_leading_zeros() {
        let p = Precision::default();

        assert_eq!(leading_zeros(ALL_VALUE_BITS, p), 0);
        // top bit of the field cleared, lowest bit cleared too
        assert_eq!(leading_zeros(562_949_953_421_310, p), 1);
        assert_eq!(leading_zeros(0, p), 50);
        assert_eq!(leading_zeros(0xFFFFF, p), 30);
        assert_eq!(leading_zeros(1, p), 49);
    }

    #[test]
    fn test_leading_zeros_other_precision() {
        let p = Precision::new(4).unwrap();
        assert_eq!(leading_zeros(0, p), 60);
        assert_eq!(leading_zeros(1 << 59, p), 0);
    }

    #[test]
    fn test_register_index() {
        let p = Precision::default();

        assert_eq!(register_index(u64::MAX, p), 16383);
        assert_eq!(register_index(ALL_VALUE_BITS, p), 0);
        assert_eq!(register_index(1 << 50, p), 1);
    }

    #[test]
    fn test_register_value() {
        let p = Precision::default();

        assert_eq!(register_value(u64::MAX, p), ALL_VALUE_BITS);
        assert_eq!(register_value(0, p), 0);
        assert_eq!(register_value(1 << 50, p), 0);
        assert_eq!(register_value((1 << 50) + 1, p), 1);
    }

    #[test]
    fn test_add_hash_updates_one_register() {
        let mut hll = HyperLogLog::new();

        // index 1, value 0: the maximum rank
        assert!(hll.add_hash(1 << 50));
        assert_eq!(hll.registers()[1], 51);
        assert_eq!(hll.zero_registers(), 16383);

        // index 16383, value with its top bit set: rank 1
        assert!(hll.add_hash(u64::MAX));
        assert_eq!(hll.registers()[16383], 1);

        // a lower rank never overwrites a higher one
        assert!(!hll.add_hash((1 << 50) | ALL_VALUE_BITS));
        assert_eq!(hll.registers()[1], 51);
    }

    #[test]
    fn test_empty_estimate() {
        let hll = HyperLogLog::new();
        assert!(hll.is_empty());
        assert_eq!(hll.estimate(), 0.0);
        assert_eq!(hll.count(), 0);
    }

    #[test]
    fn test_single_item() {
        let mut hll = HyperLogLog::new();
        hll.add(b"20");
        assert_eq!(hll.count(), 1);
    }

    #[test]
    fn test_add_same_value_multiple_times() {
        let mut hll = HyperLogLog::new();
        for _ in 0..1000 {
            hll.add(b"500");
        }
        assert_eq!(hll.count(), 1);
    }

    #[test]
    fn test_count_with_duplicates() {
        let mut once = HyperLogLog::new();
        let mut repeated = HyperLogLog::new();
        for i in 0..10_000 {
            once.add(format!("item_{}", i).as_bytes());
        }
        for _ in 0..10 {
            for i in 0..10_000 {
                repeated.add(format!("item_{}", i).as_bytes());
            }
        }
        assert_eq!(once, repeated);
        assert_eq!(once.count(), repeated.count());
    }

    #[test]
    fn test_accuracy_ten_thousand() {
        let n = 10_000u64;
        let trials = 8;
        let mut total_error = 0f64;

        for trial in 0..trials {
            let mut hll = HyperLogLog::new();
            for z in 1..=n {
                hll.add(format!("{}_{}", z, trial).as_bytes());
            }
            let error = (hll.count() as f64 - n as f64) / n as f64;
            // six standard errors for p = 14
            assert!(error.abs() < 0.05, "trial {} error {}", trial, error);
            total_error += error.abs();
        }

        let mean_error = dbg!(total_error / trials as f64);
        assert!(mean_error < 0.02);
    }

    #[test]
    fn test_merge() {
        let mut hll1 = HyperLogLog::new();
        hll1.add(b"1");
        hll1.add(b"2");

        let mut hll2 = HyperLogLog::new();
        hll2.add(b"3");
        hll2.add(b"4");

        let mut union = hll1.clone();
        union.add(b"3");
        union.add(b"4");

        hll1.merge(&hll2).unwrap();
        assert_eq!(hll1, union);
    }

    #[test]
    fn test_merge_precision_mismatch() {
        let mut hll1 = HyperLogLog::new();
        hll1.add(b"a");
        let before = hll1.clone();

        let mut hll2 = HyperLogLog::with_precision(Precision::new(12).unwrap());
        hll2.add(b"b");

        assert_eq!(
            hll1.merge(&hll2),
            Err(EstimatorError::PrecisionMismatch {
                expected: 14,
                found: 12
            })
        );
        assert_eq!(hll1, before);
    }

    #[test]
    fn test_clear() {
        let mut hll = build(&["a".to_string(), "b".to_string()]);
        assert!(!hll.is_empty());
        hll.clear();
        assert!(hll.is_empty());
        assert_eq!(hll.count(), 0);
    }

    quickcheck! {
        fn prop_registers_never_decrease(items: Vec<String>) -> bool {
            let mut hll = HyperLogLog::new();
            let mut previous = hll.registers().to_vec();
            for item in &items {
                hll.add(item.as_bytes());
                if previous.iter().zip(hll.registers()).any(|(old, new)| new < old) {
                    return false;
                }
                previous = hll.registers().to_vec();
            }
            true
        }

        fn prop_readding_keeps_estimate(items: Vec<String>) -> bool {
            let mut hll = build(&items);
            let before = hll.count();
            for item in &items {
                hll.add(item.as_bytes());
            }
            hll.count() == before
        }

        fn prop_merge_equals_union(a: Vec<String>, b: Vec<String>) -> bool {
            let mut merged = build(&a);
            merged.merge(&build(&b)).unwrap();

            let union: Vec<String> = a.iter().chain(b.iter()).cloned().collect();
            merged == build(&union)
        }

        fn prop_merge_commutative(a: Vec<String>, b: Vec<String>) -> bool {
            let mut ab = build(&a);
            ab.merge(&build(&b)).unwrap();
            let mut ba = build(&b);
            ba.merge(&build(&a)).unwrap();
            ab == ba
        }

        fn prop_merge_associative(a: Vec<String>, b: Vec<String>, c: Vec<String>) -> bool {
            let mut left = build(&a);
            left.merge(&build(&b)).unwrap();
            left.merge(&build(&c)).unwrap();

            let mut bc = build(&b);
            bc.merge(&build(&c)).unwrap();
            let mut right = build(&a);
            right.merge(&bc).unwrap();

            left == right
        }

        fn prop_merge_idempotent(a: Vec<String>) -> bool {
            let mut hll = build(&a);
            let copy = hll.clone();
            hll.merge(&copy).unwrap();
            hll == copy
        }
    }
}
