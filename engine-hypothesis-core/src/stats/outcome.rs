use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::Side;

/// Failure of a batch source to deliver a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    /// The source has no more data, e.g. the engine process exited.
    #[error("source exhausted: {0}")]
    Exhausted(String),

    /// The source produced output that is not a valid score/throughput pair.
    #[error("malformed output: {0}")]
    Malformed(String),

    /// The batch did not complete within the configured time.
    #[error("batch timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Reading from or writing to the source failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// A fatal data problem that ends the current test run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A source reported a failure.
    #[error("{} engine failed: {error}", .side.label())]
    Source { side: Side, error: BatchError },

    /// A source returned a batch of the wrong length without reporting a failure.
    #[error("{} engine returned {received} of {requested} requested samples", .side.label())]
    BatchSizeMismatch {
        side: Side,
        requested: usize,
        received: usize,
    },
}

impl DataError {
    /// The engine that caused the error.
    pub fn side(&self) -> Side {
        match self {
            DataError::Source { side, .. } | DataError::BatchSizeMismatch { side, .. } => *side,
        }
    }
}

/// Terminal result of a sequential test run.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// The candidate (A) scores significantly higher than the baseline.
    CandidateBetter,
    /// The baseline (B) scores significantly higher than the candidate.
    BaselineBetter,
    /// The round or sample budget ran out without significance.
    Inconclusive,
    /// Collection stopped because a source failed.
    DataError(DataError),
    /// The run was cancelled between or during rounds.
    Cancelled,
}

impl TestOutcome {
    /// Outcome declaring `side` the better engine.
    pub fn winner(side: Side) -> Self {
        match side {
            Side::Candidate => TestOutcome::CandidateBetter,
            Side::Baseline => TestOutcome::BaselineBetter,
        }
    }

    /// Stable machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TestOutcome::CandidateBetter => "candidate_better",
            TestOutcome::BaselineBetter => "baseline_better",
            TestOutcome::Inconclusive => "inconclusive",
            TestOutcome::DataError(_) => "data_error",
            TestOutcome::Cancelled => "cancelled",
        }
    }

    pub fn is_data_error(&self) -> bool {
        matches!(self, TestOutcome::DataError(_))
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::CandidateBetter => write!(f, "candidate is significantly better"),
            TestOutcome::BaselineBetter => write!(f, "baseline is significantly better"),
            TestOutcome::Inconclusive => write!(f, "inconclusive, budget exhausted"),
            TestOutcome::DataError(err) => write!(f, "data error: {}", err),
            TestOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}
