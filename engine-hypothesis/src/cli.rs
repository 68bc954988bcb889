//! Command-line interface for engine-hypothesis.

use crate::config::Config;
use clap::{Parser, ValueEnum};
use engine_hypothesis_core::RequestStyle;
use std::path::PathBuf;

/// How progress and the verdict are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress lines and summary
    #[default]
    Terminal,
    /// One JSON object per event
    Json,
}

/// Request line style accepted by the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    /// `-g <games> [extra args]`
    Flags,
    /// `<games> <ms_per_move> <threads>`
    Positional,
}

impl From<StyleArg> for RequestStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Flags => RequestStyle::Flags,
            StyleArg::Positional => RequestStyle::Positional,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "engine-hypothesis")]
#[command(about = "Sequential A/B testing of two game engines with a Welch t-test")]
#[command(version)]
pub struct Cli {
    /// Command that starts the baseline engine (B)
    pub baseline: String,

    /// Command that starts the candidate engine (A)
    pub candidate: String,

    /// Games requested from each engine per round
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Confidence level of the interval (0.0-1.0, exclusive)
    #[arg(long)]
    pub confidence_level: Option<f64>,

    /// Stop after this many rounds
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Stop after this many games per engine
    #[arg(long)]
    pub max_samples: Option<usize>,

    /// Keep sampling after significance until a budget is exhausted
    #[arg(long)]
    pub run_to_budget: bool,

    /// Fail a batch that takes longer than this many milliseconds
    #[arg(long)]
    pub batch_timeout_ms: Option<u64>,

    /// Request line style understood by the engines
    #[arg(long, value_enum)]
    pub request_style: Option<StyleArg>,

    /// Thinking time per move sent with positional requests
    #[arg(long)]
    pub ms_per_move: Option<u32>,

    /// Thread count sent with positional requests
    #[arg(long)]
    pub threads: Option<u32>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Disable colored terminal output
    #[arg(long)]
    pub no_color: bool,

    /// Print engine stderr for debugging
    #[arg(long)]
    pub engine_output: bool,

    /// Path to config file [default: .engine-hypothesis.toml if present]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only non-None optional values and set flags override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(batch_size) = self.batch_size {
            config.sampling.batch_size = batch_size;
        }
        if let Some(confidence_level) = self.confidence_level {
            config.hypothesis.confidence_level = confidence_level;
        }
        if let Some(max_rounds) = self.max_rounds {
            config.sampling.max_rounds = Some(max_rounds);
        }
        if let Some(max_samples) = self.max_samples {
            config.sampling.max_samples = Some(max_samples);
        }
        if self.run_to_budget {
            config.hypothesis.stop_on_significance = false;
        }

        if let Some(timeout) = self.batch_timeout_ms {
            config.engine.batch_timeout_ms = Some(timeout);
        }
        if let Some(style) = self.request_style {
            config.engine.request_style = style.into();
        }
        if let Some(ms_per_move) = self.ms_per_move {
            config.engine.ms_per_move = ms_per_move;
        }
        if let Some(threads) = self.threads {
            config.engine.threads = threads;
        }
        if self.engine_output {
            config.engine.show_stderr = true;
        }
    }
}
