use crate::stats::{RoundStatistics, SignificanceTransition, TestOutcome};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives progress and the final summary of a sequential test run.
pub trait Reporter: Send + Sync {
    /// Called after every round that produced statistics.
    fn on_round(
        &self,
        stats: &RoundStatistics,
        transition: SignificanceTransition,
    ) -> Result<(), ReportError>;

    /// Called exactly once when the run ends, with the last computed statistics if any.
    fn on_terminate(
        &self,
        outcome: &TestOutcome,
        final_stats: Option<&RoundStatistics>,
    ) -> Result<(), ReportError>;
}

mod json;
mod terminal;
pub use json::JsonReporter;
pub use terminal::TerminalReporter;
