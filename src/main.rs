mod demo;

use clap::Parser;
use hll_estimator::Precision;
use hll_estimator::precision::DEFAULT_PRECISION;
use hll_estimator::sweep::{self, SweepConfig};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xxhash_rust::xxh64::Xxh64Builder;

/// Measures estimator accuracy for every cardinality from 1 to a maximum and
/// writes `expected,actual,error` rows as CSV.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Largest true cardinality to measure
    #[arg(long, default_value_t = 100_000)]
    max_cardinality: u64,

    /// Number of hash bits used to select a register
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: u8,

    #[arg(long, default_value = "output.csv")]
    output: PathBuf,

    /// Also render the results as a PNG chart
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Measure on a single thread
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = SweepConfig {
        max_cardinality: args.max_cardinality,
        precision: Precision::new(args.precision)?,
        parallel: !args.sequential,
    };

    // The sweep uses the Xxh64 hash function.
    // You can use a different hash function by providing a different BuildHasher.
    let mut sink = BufWriter::new(File::create(&args.output)?);
    let report = sweep::run_sweep::<Xxh64Builder, _>(&config, &mut sink)?;

    println!(
        "{:<15} {:<15} {:<15}",
        "Precision", "Max |err| (%)", "Mean |err| (%)"
    );
    println!("{:-<45}", "");
    println!(
        "{:<15} {:<15.4} {:<15.4}",
        config.precision.to_string(),
        report.max_abs_error,
        report.mean_abs_error
    );
    println!(
        "Theoretical relative error: {:.4}%",
        config.precision.relative_error() * 100.0
    );
    println!("Results written to {}", args.output.display());

    if let Some(path) = &args.plot {
        demo::error_plot::plot_errors(&report, path)?;
    }

    Ok(())
}
