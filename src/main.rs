//! Streaming anomaly scores command line application.
//!
//! One number per line is read from stdin, or generated with `--synthetic`.
//! The values are shingled and scored with a robust random cut forest, and
//! one CSV record `index,value,score` is written to stdout for every value
//! that completes a shingle. Logs go to stderr and are filtered with
//! `RUST_LOG`.

use std::error::Error;
use std::io::{self, BufRead, BufWriter, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rrcflib::{score_stream, Forest, ForestBuilder, NoisySine, ShingledForest};

/// Streaming robust random cut forest anomaly scoring.
///
/// Input values are read from stdin, one per line. The index column of the
/// output is the position of the value in the input.
#[derive(Parser)]
#[command(name = "rrcf", version)]
struct Opts {
    /// Number of consecutive values forming one point
    #[arg(short = 'k', long, default_value_t = 4)]
    shingle_size: usize,

    /// Number of trees used in the model
    #[arg(short, long, default_value_t = 100)]
    num_trees: usize,

    /// Number of points in the sliding window of every tree
    #[arg(short, long, default_value_t = 256)]
    tree_size: usize,

    /// Seed for reproducible scores
    #[arg(short, long)]
    seed: Option<u64>,

    /// Process the trees of the forest in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Score a generated noisy sine wave instead of stdin
    #[arg(long)]
    synthetic: bool,
}

#[derive(Debug, Error)]
#[error("line {line}: cannot parse {input:?} as a number")]
struct ParseLineError {
    line: usize,
    input: String,
}

fn write_record<W: Write>(out: &mut W, index: usize, value: f64, score: f64) -> io::Result<()> {
    writeln!(out, "{},{:.6},{:.6}", index, value, score)
}

fn run_stdin<W: Write>(
    forest: Forest<f64>,
    shingle_size: usize,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let mut shingled = ShingledForest::new(forest, shingle_size)?;
    let mut index = 0;
    for (position, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let value: f64 = input.parse().map_err(|_| ParseLineError {
            line: position + 1,
            input: input.to_string(),
        })?;
        if let Some(score) = shingled.add_value(value)? {
            write_record(out, index, value, score)?;
        }
        index += 1;
    }
    Ok(())
}

fn run_synthetic<W: Write>(
    mut forest: Forest<f64>,
    shingle_size: usize,
    seed: u64,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let signal = NoisySine::new(seed);
    info!(anomalous = ?signal.anomalous_indices, "generated noisy sine");
    for record in score_stream(signal.data, &mut forest, shingle_size)? {
        let record = record?;
        write_record(out, record.index + shingle_size - 1, record.value, record.score)?;
    }
    Ok(())
}

fn run(opts: &Opts) -> Result<(), Box<dyn Error>> {
    let mut builder =
        ForestBuilder::new(opts.num_trees, opts.tree_size).parallel_enabled(opts.parallel);
    if let Some(seed) = opts.seed {
        builder = builder.random_seed(seed);
    }
    let forest: Forest<f64> = builder.build()?;
    debug!(shingle_size = opts.shingle_size, "starting run");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "\"x\",\"y\",\"value\"")?;
    if opts.synthetic {
        run_synthetic(forest, opts.shingle_size, opts.seed.unwrap_or(0), &mut out)?;
    } else {
        run_stdin(forest, opts.shingle_size, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let opts = Opts::parse();

    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).without_time())
        .init();

    if let Err(err) = run(&opts) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
