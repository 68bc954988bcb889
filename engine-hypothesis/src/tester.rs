//! Sequential hypothesis test driving two batch sources.
//!
//! The tester requests one batch from each engine per round, merges the
//! batches into the accumulated series, recomputes the Welch confidence
//! interval and stops as soon as the configured stopping rule fires.

use engine_hypothesis_core::{
    BatchError, DataError, Reporter, RoundStatistics, Sample, SampleSeries, Side,
    SignificanceTransition, TestOutcome, WelchInterval,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::source::BatchSource;

/// Invalid tester configuration, rejected before any batch is requested.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("batch_size must be positive")]
    InvalidBatchSize,

    #[error("confidence_level must be between 0 and 1 (exclusive), got {0}")]
    InvalidConfidenceLevel(f64),

    #[error("max_rounds must be positive")]
    InvalidMaxRounds,

    #[error("max_samples ({max_samples}) is smaller than one batch ({batch_size})")]
    MaxSamplesBelowBatch {
        max_samples: usize,
        batch_size: usize,
    },
}

/// Parameters of a sequential test run.
#[derive(Debug, Clone, PartialEq)]
pub struct TesterConfig {
    /// Samples requested from each engine per round.
    pub batch_size: usize,
    /// Two-sided confidence level of the interval.
    pub confidence_level: f64,
    /// Stop on the first round whose interval excludes zero.
    pub stop_on_significance: bool,
    /// Maximum number of rounds, unbounded if `None`.
    pub max_rounds: Option<usize>,
    /// Maximum number of samples per engine, unbounded if `None`.
    ///
    /// The last round requests fewer than `batch_size` samples when a full
    /// batch would pass this ceiling.
    pub max_samples: Option<usize>,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            confidence_level: 0.95,
            stop_on_significance: true,
            max_rounds: None,
            max_samples: None,
        }
    }
}

impl TesterConfig {
    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize);
        }
        // Written so that NaN is rejected too
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigurationError::InvalidConfidenceLevel(
                self.confidence_level,
            ));
        }
        if self.max_rounds == Some(0) {
            return Err(ConfigurationError::InvalidMaxRounds);
        }
        if let Some(max_samples) = self.max_samples {
            if max_samples < self.batch_size {
                return Err(ConfigurationError::MaxSamplesBelowBatch {
                    max_samples,
                    batch_size: self.batch_size,
                });
            }
        }
        Ok(())
    }
}

/// Everything known at the end of a run.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub outcome: TestOutcome,
    /// Statistics of the last round that produced them, if any.
    pub final_stats: Option<RoundStatistics>,
    /// Number of rounds whose batches were merged.
    pub rounds: usize,
    /// Samples collected from the candidate (A).
    pub candidate: SampleSeries,
    /// Samples collected from the baseline (B).
    pub baseline: SampleSeries,
}

/// Sequential Welch t-test between a candidate (A) and a baseline (B) engine.
///
/// The tester exclusively owns both accumulated series. They only change
/// between rounds, when both batches of the round have arrived in full.
#[derive(Debug)]
pub struct SequentialTester {
    config: TesterConfig,
    interval: WelchInterval,
    candidate: SampleSeries,
    baseline: SampleSeries,
}

impl SequentialTester {
    /// Create a tester with empty series.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: TesterConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            interval: WelchInterval::new(config.confidence_level),
            config,
            candidate: SampleSeries::new(),
            baseline: SampleSeries::new(),
        })
    }

    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Run the test until significance, budget exhaustion, a data error or cancellation.
    ///
    /// The reporter sees every round with statistics, then exactly one
    /// `on_terminate` call carrying the last computed statistics.
    pub async fn run<A, B>(
        mut self,
        candidate: &mut A,
        baseline: &mut B,
        reporter: &dyn Reporter,
        cancel: &CancellationToken,
    ) -> TestReport
    where
        A: BatchSource,
        B: BatchSource,
    {
        let mut rounds = 0;
        let mut last_stats: Option<RoundStatistics> = None;
        let mut was_significant = false;

        let outcome = loop {
            if cancel.is_cancelled() {
                break TestOutcome::Cancelled;
            }
            let round = rounds + 1;
            let batch_size = self.next_batch_size();

            let batches = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                batches = async {
                    tokio::join!(
                        candidate.request_batch(batch_size),
                        baseline.request_batch(batch_size)
                    )
                } => Some(batches),
            };
            let Some((candidate_batch, baseline_batch)) = batches else {
                debug!(round, "abandoning in-flight batches");
                break TestOutcome::Cancelled;
            };

            let checked = (
                check_batch(Side::Candidate, batch_size, candidate_batch),
                check_batch(Side::Baseline, batch_size, baseline_batch),
            );
            let (candidate_batch, baseline_batch) = match checked {
                (Ok(a), Ok(b)) => (a, b),
                (Err(err), _) | (_, Err(err)) => {
                    warn!(round, error = %err, "stopping collection");
                    break TestOutcome::DataError(err);
                }
            };

            self.candidate.extend(candidate_batch);
            self.baseline.extend(baseline_batch);
            rounds = round;
            debug!(round, n = self.candidate.count(), "merged batches");

            let Some(stats) = self.interval.compute(round, &self.candidate, &self.baseline) else {
                if self.budget_reached(round) {
                    break TestOutcome::Inconclusive;
                }
                continue;
            };

            let transition = SignificanceTransition::between(was_significant, stats.significant);
            was_significant = stats.significant;
            debug!(
                round,
                n = stats.n,
                delta = stats.delta,
                lo = stats.lo,
                hi = stats.hi,
                df = stats.degrees_of_freedom,
                "computed round statistics"
            );
            if let Err(err) = reporter.on_round(&stats, transition) {
                warn!(error = %err, "failed to report round");
            }

            let winner = stats.winner();
            last_stats = Some(stats);

            if let Some(side) = winner {
                if self.config.stop_on_significance {
                    break TestOutcome::winner(side);
                }
            }
            if self.budget_reached(round) {
                break winner.map_or(TestOutcome::Inconclusive, TestOutcome::winner);
            }
        };

        info!(%outcome, rounds, n = self.candidate.count(), "sequential test finished");
        if let Err(err) = reporter.on_terminate(&outcome, last_stats.as_ref()) {
            warn!(error = %err, "failed to report final summary");
        }

        TestReport {
            outcome,
            final_stats: last_stats,
            rounds,
            candidate: self.candidate,
            baseline: self.baseline,
        }
    }

    /// Samples to request this round, capped by the remaining sample budget.
    fn next_batch_size(&self) -> usize {
        let batch_size = self.config.batch_size;
        match self.config.max_samples {
            Some(max) => batch_size.min(max.saturating_sub(self.candidate.count())),
            None => batch_size,
        }
    }

    /// Whether the configured round or sample budget has been used up.
    fn budget_reached(&self, round: usize) -> bool {
        let rounds_spent = self.config.max_rounds.is_some_and(|max| round >= max);
        let samples_spent = self
            .config
            .max_samples
            .is_some_and(|max| self.candidate.count() >= max);
        rounds_spent || samples_spent
    }
}

/// Turn a source's answer into a full, valid batch or a data error.
fn check_batch(
    side: Side,
    requested: usize,
    result: Result<Vec<Sample>, BatchError>,
) -> Result<Vec<Sample>, DataError> {
    let batch = result.map_err(|error| DataError::Source { side, error })?;

    if batch.len() != requested {
        return Err(DataError::BatchSizeMismatch {
            side,
            requested,
            received: batch.len(),
        });
    }
    if let Some(invalid) = batch.iter().find(|s| !s.is_valid()) {
        return Err(DataError::Source {
            side,
            error: BatchError::Malformed(format!(
                "invalid sample (score {}, throughput {})",
                invalid.score, invalid.throughput
            )),
        });
    }

    Ok(batch)
}
