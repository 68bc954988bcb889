//! Core types and statistics for engine-hypothesis.
//!
//! This crate provides the sample accumulator, the Welch confidence interval,
//! the engine line protocol and the reporters shared by the engine-hypothesis
//! CLI and the engine-side harness.

pub mod protocol;
pub mod report;
pub mod stats;

// Re-export main types for convenience
pub use protocol::{BatchRequest, ProtocolError, RequestFormat, RequestStyle};
pub use report::{JsonReporter, ReportError, Reporter, TerminalReporter};
pub use stats::{
    BatchError, DataError, RoundStatistics, Sample, SampleSeries, Side, SignificanceTransition,
    TestOutcome, WelchInterval,
};
