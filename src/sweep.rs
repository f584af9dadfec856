//! Accuracy sweep over a range of true cardinalities.
//!
//! For every cardinality `n` in `1..=max_cardinality` a fresh estimator is fed
//! `n` distinct synthetic items and its count is compared with `n`. Rows are
//! written as CSV to a caller-supplied sink.

use crate::Counter;
use crate::HyperLogLog;
use crate::error::SweepError;
use crate::precision::Precision;
use rayon::prelude::*;
use std::hash::BuildHasher;
use std::io::Write;

pub const CSV_HEADER: &str = "expected,actual,error";

// Progress is logged once per this many rows
const PROGRESS_INTERVAL: u64 = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub max_cardinality: u64,
    pub precision: Precision,
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            max_cardinality: 100_000,
            precision: Precision::default(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRow {
    pub expected: u64,
    pub actual: u64,
    /// Signed relative error in percent.
    pub error: f64,
}

impl SweepRow {
    fn write_csv<W: Write>(&self, sink: &mut W) -> std::io::Result<()> {
        writeln!(sink, "{},{},{}", self.expected, self.actual, self.error)
    }
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub rows: Vec<SweepRow>,
    pub max_abs_error: f64,
    pub mean_abs_error: f64,
}

impl SweepReport {
    fn from_rows(rows: Vec<SweepRow>) -> Self {
        let (max_abs_error, sum_abs_error) = rows
            .iter()
            .fold((0f64, 0f64), |(max, sum), row| {
                (max.max(row.error.abs()), sum + row.error.abs())
            });
        let mean_abs_error = if rows.is_empty() {
            0.0
        } else {
            sum_abs_error / rows.len() as f64
        };

        SweepReport {
            rows,
            max_abs_error,
            mean_abs_error,
        }
    }
}

/// The `z`-th synthetic item of the stream for `cardinality`.
///
/// Items are unique within a stream and differ between streams, so every
/// cardinality is measured on fresh data.
pub fn synthetic_item(z: u64, cardinality: u64) -> String {
    format!("{}_{}", z, cardinality)
}

/// Feeds `cardinality` distinct items into a fresh estimator and compares its
/// count with the truth.
pub fn measure<S: BuildHasher + Default>(cardinality: u64, precision: Precision) -> SweepRow {
    let mut counter = HyperLogLog::<S>::with_hasher(precision, S::default());
    for z in 1..=cardinality {
        counter.add(synthetic_item(z, cardinality).as_bytes());
    }

    let actual = counter.count();
    let error = (actual as f64 - cardinality as f64) / cardinality as f64 * 100.0;

    SweepRow {
        expected: cardinality,
        actual,
        error,
    }
}

/// Runs the sweep described by `config`, writing the CSV header and one row
/// per cardinality, in ascending order, to `sink`.
pub fn run_sweep<S, W>(config: &SweepConfig, sink: &mut W) -> Result<SweepReport, SweepError>
where
    S: BuildHasher + Default + Send + Sync,
    W: Write,
{
    if config.max_cardinality == 0 {
        return Err(SweepError::EmptyRange);
    }

    tracing::info!(
        max_cardinality = config.max_cardinality,
        precision = config.precision.bits(),
        parallel = config.parallel,
        "starting sweep"
    );

    writeln!(sink, "{}", CSV_HEADER)?;

    let rows: Vec<SweepRow> = if config.parallel {
        let rows: Vec<SweepRow> = (1..=config.max_cardinality)
            .into_par_iter()
            .map(|n| measure::<S>(n, config.precision))
            .collect();
        for row in &rows {
            row.write_csv(sink)?;
        }
        rows
    } else {
        let mut rows = Vec::with_capacity(config.max_cardinality as usize);
        for n in 1..=config.max_cardinality {
            let row = measure::<S>(n, config.precision);
            row.write_csv(sink)?;
            if n % PROGRESS_INTERVAL == 0 {
                tracing::debug!(cardinality = n, error = row.error, "sweep progress");
            }
            rows.push(row);
        }
        rows
    };
    sink.flush()?;

    let report = SweepReport::from_rows(rows);
    tracing::info!(
        rows = report.rows.len(),
        max_abs_error = report.max_abs_error,
        mean_abs_error = report.mean_abs_error,
        "sweep finished"
    );
    Ok(report)
}
