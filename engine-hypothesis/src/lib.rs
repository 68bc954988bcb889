//! engine-hypothesis: sequential A/B testing of game engines
//!
//! This library drives two engines batch by batch, recomputes a Welch
//! confidence interval on the difference of their mean scores after every
//! round and stops as soon as the interval excludes zero.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod source;
pub mod tester;

// Re-export core types for convenience
pub use engine_hypothesis_core::protocol;
pub use engine_hypothesis_core::report::{JsonReporter, ReportError, Reporter, TerminalReporter};
pub use engine_hypothesis_core::stats::{
    BatchError, DataError, RoundStatistics, Sample, SampleSeries, Side, SignificanceTransition,
    TestOutcome, WelchInterval,
};

// Re-export main types from this crate
pub use cancel::CancellationToken;
pub use cli::{Cli, OutputFormat};
pub use config::Config;
pub use source::{BatchSource, EngineCommand, EngineConnection, EngineProcess, SourceError};
pub use tester::{ConfigurationError, SequentialTester, TestReport, TesterConfig};
