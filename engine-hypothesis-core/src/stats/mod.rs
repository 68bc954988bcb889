use serde::{Deserialize, Serialize};

/// Identifies which engine of a comparison a value belongs to.
///
/// The candidate is engine "A" (the new engine), the baseline is engine "B".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Baseline,
    Candidate,
}

impl Side {
    /// The opposite side of the comparison.
    pub fn other(self) -> Self {
        match self {
            Side::Baseline => Side::Candidate,
            Side::Candidate => Side::Baseline,
        }
    }

    /// Short label used in progress output.
    pub fn label(self) -> &'static str {
        match self {
            Side::Baseline => "baseline",
            Side::Candidate => "candidate",
        }
    }
}

/// The result of one completed game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Final score of the game.
    pub score: f64,
    /// Search throughput during the game (e.g. visits per second), never negative.
    pub throughput: f64,
}

impl Sample {
    pub fn new(score: f64, throughput: f64) -> Self {
        Self { score, throughput }
    }

    /// Whether the sample satisfies the score/throughput invariants.
    pub fn is_valid(&self) -> bool {
        self.score.is_finite() && self.throughput.is_finite() && self.throughput >= 0.0
    }
}

/// Statistics recomputed after every round from the full accumulated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStatistics {
    /// One-based index of the round these statistics were computed on.
    pub round: usize,
    /// Samples per engine.
    pub n: usize,
    /// Mean score of the candidate (A).
    pub mean_a: f64,
    /// Mean score of the baseline (B).
    pub mean_b: f64,
    pub std_dev_a: f64,
    pub std_dev_b: f64,
    /// Mean throughput of the candidate.
    pub throughput_a: f64,
    /// Mean throughput of the baseline.
    pub throughput_b: f64,
    /// `mean_a - mean_b`; positive means the candidate scores higher.
    pub delta: f64,
    pub standard_error: f64,
    /// Welch-Satterthwaite degrees of freedom.
    pub degrees_of_freedom: f64,
    /// Two-sided critical value of Student's t.
    pub t_critical: f64,
    pub confidence_level: f64,
    /// Lower bound of the confidence interval for `delta`.
    pub lo: f64,
    /// Upper bound of the confidence interval for `delta`.
    pub hi: f64,
    /// Whether the interval excludes zero.
    pub significant: bool,
}

impl RoundStatistics {
    /// The better engine if the interval excludes zero, chosen by the sign of `delta`.
    pub fn winner(&self) -> Option<Side> {
        if !self.significant {
            None
        } else if self.delta > 0.0 {
            Some(Side::Candidate)
        } else {
            Some(Side::Baseline)
        }
    }
}

/// Change of significance between consecutive rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceTransition {
    /// Significance is unchanged since the previous round.
    None,
    /// The interval excludes zero for the first time since it last did not.
    NewlySignificant,
    /// The interval included zero again after having excluded it.
    NoLongerSignificant,
}

impl SignificanceTransition {
    /// Edge-triggered transition from the previous round's significance to the current one.
    pub fn between(was_significant: bool, is_significant: bool) -> Self {
        match (was_significant, is_significant) {
            (false, true) => Self::NewlySignificant,
            (true, false) => Self::NoLongerSignificant,
            _ => Self::None,
        }
    }
}

mod outcome;
mod series;
mod welch;

pub use outcome::{BatchError, DataError, TestOutcome};
pub use series::SampleSeries;
pub use welch::WelchInterval;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_other() {
        assert_eq!(Side::Baseline.other(), Side::Candidate);
        assert_eq!(Side::Candidate.other(), Side::Baseline);
    }

    #[test]
    fn test_sample_validity() {
        assert!(Sample::new(120.0, 0.0).is_valid());
        assert!(Sample::new(-3.5, 1e6).is_valid());
        assert!(!Sample::new(1.0, -1.0).is_valid());
        assert!(!Sample::new(f64::NAN, 1.0).is_valid());
        assert!(!Sample::new(1.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_transition_is_edge_triggered() {
        use SignificanceTransition::*;
        assert_eq!(SignificanceTransition::between(false, false), None);
        assert_eq!(SignificanceTransition::between(false, true), NewlySignificant);
        assert_eq!(SignificanceTransition::between(true, true), None);
        assert_eq!(SignificanceTransition::between(true, false), NoLongerSignificant);
    }
}
