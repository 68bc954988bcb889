//! Synthetic engine speaking the engine-hypothesis line protocol.
//!
//! Useful for trying out the tester without a real engine:
//!
//! ```text
//! engine-hypothesis "mock-engine --mean 0" "mock-engine --mean 5"
//! ```

use anyhow::Result;
use clap::Parser;
use engine_hypothesis_harness::{run_harness, MockEngine, MockEngineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mock-engine")]
#[command(about = "Plays fake games with scores drawn around a fixed mean")]
#[command(version)]
struct Args {
    /// Mean score per game
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    mean: f64,

    /// Scores are drawn uniformly from mean ± spread
    #[arg(long, default_value_t = 100.0)]
    spread: f64,

    /// Throughput per search thread
    #[arg(long, default_value_t = 1_000_000.0)]
    throughput: f64,

    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = MockEngine::new(MockEngineConfig {
        mean: args.mean,
        spread: args.spread,
        throughput: args.throughput,
        seed: args.seed,
    });

    let batches = run_harness(engine)?;
    tracing::debug!(batches, "mock engine finished");
    Ok(())
}
