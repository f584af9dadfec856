use crate::Counter;
use crate::HyperLogLog;
use crate::error::EstimatorError;
use crate::precision::Precision;
use rayon::prelude::*;
use std::hash::BuildHasher;

// Smallest shard that gets its own estimator
const MIN_SHARD_LEN: usize = 4096;

/// Counts `items` by building one estimator per rayon shard and merging them.
///
/// The registers of the result are identical to those of a single estimator
/// fed every item in order.
pub fn count_parallel<S, T>(
    items: &[T],
    precision: Precision,
) -> Result<HyperLogLog<S>, EstimatorError>
where
    S: BuildHasher + Default + Send + Sync,
    T: AsRef<[u8]> + Sync,
{
    let shard_len = std::cmp::max(
        MIN_SHARD_LEN,
        items.len().div_ceil(rayon::current_num_threads()),
    );

    let counter = items
        .par_chunks(shard_len)
        .map(|shard| {
            let mut counter = HyperLogLog::<S>::with_hasher(precision, S::default());
            for item in shard {
                counter.add(item.as_ref());
            }
            Ok::<_, EstimatorError>(counter)
        })
        .try_reduce(
            || HyperLogLog::<S>::with_hasher(precision, S::default()),
            |mut a, b| {
                a.merge(&b)?;
                Ok(a)
            },
        )?;

    tracing::debug!(
        items = items.len(),
        shard_len,
        precision = precision.bits(),
        "parallel count finished"
    );
    Ok(counter)
}

/// Merges a sequence of estimators into the first one.
///
/// Returns `Ok(None)` for an empty sequence and stops at the first estimator
/// whose precision differs.
pub fn merge_all<S, I>(counters: I) -> Result<Option<HyperLogLog<S>>, EstimatorError>
where
    I: IntoIterator<Item = HyperLogLog<S>>,
{
    let mut counters = counters.into_iter();
    let Some(mut merged) = counters.next() else {
        return Ok(None);
    };

    for counter in counters {
        merged.merge(&counter)?;
    }

    Ok(Some(merged))
}
