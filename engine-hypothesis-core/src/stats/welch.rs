use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use super::{RoundStatistics, SampleSeries};

/// Above this many degrees of freedom the standard normal quantile is used.
/// statrs' t quantile does not converge for very large df.
const NORMAL_APPROXIMATION_DF: f64 = 1e5;

/// Two-sided Welch confidence interval for the difference of two means.
///
/// This is the interval the sequential tester recomputes after every round. It
/// does not assume equal variances between the two engines.
#[derive(Debug, Clone)]
pub struct WelchInterval {
    /// The two-sided confidence level of the interval (default: 0.95).
    pub confidence_level: f64,
}

impl Default for WelchInterval {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl WelchInterval {
    /// Create a Welch interval with the specified confidence level.
    ///
    /// # Panics
    /// Panics if confidence_level is not in the range (0, 1).
    pub fn new(confidence_level: f64) -> Self {
        assert!(
            confidence_level > 0.0 && confidence_level < 1.0,
            "confidence_level must be between 0 and 1 (exclusive)"
        );
        Self { confidence_level }
    }

    /// Calculate degrees of freedom using the Welch-Satterthwaite equation.
    ///
    /// df = (var1/n1 + var2/n2)^2 / ((var1/n1)^2/(n1-1) + (var2/n2)^2/(n2-1))
    ///
    /// Both `n1` and `n2` must be at least 2.
    pub fn welch_satterthwaite_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
        let s1 = var1 / n1 as f64;
        let s2 = var2 / n2 as f64;
        let numerator = (s1 + s2).powi(2);
        let denominator = (s1.powi(2) / (n1 - 1) as f64) + (s2.powi(2) / (n2 - 1) as f64);

        if denominator == 0.0 {
            // Both variances are zero: fall back to the pooled df
            return (n1.min(n2) - 1) as f64;
        }

        numerator / denominator
    }

    /// Two-sided critical value of Student's t at `(1 + confidence) / 2`.
    ///
    /// Uses the standard normal quantile once `df` exceeds 1e5. Returns
    /// infinity when the distribution cannot be built, which widens the
    /// interval to never exclude zero.
    pub fn critical_value(&self, df: f64) -> f64 {
        let p = (1.0 + self.confidence_level) / 2.0;
        if df > NORMAL_APPROXIMATION_DF {
            return match Normal::new(0.0, 1.0) {
                Ok(normal) => normal.inverse_cdf(p),
                Err(_) => f64::INFINITY,
            };
        }
        match StudentsT::new(0.0, 1.0, df) {
            Ok(t_dist) => t_dist.inverse_cdf(p),
            Err(_) => f64::INFINITY,
        }
    }

    /// Compute the round statistics for candidate series `a` against baseline `b`.
    ///
    /// Returns `None` until both series hold at least two samples.
    pub fn compute(
        &self,
        round: usize,
        a: &SampleSeries,
        b: &SampleSeries,
    ) -> Option<RoundStatistics> {
        let (n_a, n_b) = (a.count(), b.count());
        let mean_a = a.mean()?;
        let mean_b = b.mean()?;
        let var_a = a.variance()?;
        let var_b = b.variance()?;

        let delta = mean_a - mean_b;
        let standard_error = (var_a / n_a as f64 + var_b / n_b as f64).sqrt();
        let degrees_of_freedom = Self::welch_satterthwaite_df(var_a, n_a, var_b, n_b);
        let t_critical = self.critical_value(degrees_of_freedom);

        // A zero standard error collapses the interval regardless of t
        let margin = if standard_error == 0.0 {
            0.0
        } else {
            t_critical * standard_error
        };
        let lo = delta - margin;
        let hi = delta + margin;

        Some(RoundStatistics {
            round,
            n: n_a.min(n_b),
            mean_a,
            mean_b,
            std_dev_a: var_a.sqrt(),
            std_dev_b: var_b.sqrt(),
            throughput_a: a.throughput_mean()?,
            throughput_b: b.throughput_mean()?,
            delta,
            standard_error,
            degrees_of_freedom,
            t_critical,
            confidence_level: self.confidence_level,
            lo,
            hi,
            significant: lo > 0.0 || hi < 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Sample, Side};

    fn series(scores: &[f64]) -> SampleSeries {
        let mut series = SampleSeries::new();
        series.extend(scores.iter().map(|&s| Sample::new(s, 5000.0)));
        series
    }

    #[test]
    fn test_clear_candidate_win() {
        let interval = WelchInterval::default();
        let a = series(&[10.0, 11.0, 9.0, 10.0, 10.0]);
        let b = series(&[0.0, 1.0, -1.0, 0.0, 0.0]);

        let stats = interval.compute(1, &a, &b).unwrap();

        assert!((stats.delta - 10.0).abs() < 1e-12);
        // var = 0.5 on both sides, n = 5 => df = 8
        assert!((stats.degrees_of_freedom - 8.0).abs() < 1e-9);
        assert!((stats.standard_error - 0.2_f64.sqrt()).abs() < 1e-12);
        assert!((stats.t_critical - 2.306).abs() < 1e-3);
        assert!(stats.lo > 0.0);
        assert!(stats.significant);
        assert_eq!(stats.winner(), Some(Side::Candidate));
    }

    #[test]
    fn test_clear_baseline_win() {
        let interval = WelchInterval::default();
        let a = series(&[0.0, 1.0, -1.0, 0.0, 0.0]);
        let b = series(&[10.0, 11.0, 9.0, 10.0, 10.0]);

        let stats = interval.compute(1, &a, &b).unwrap();

        assert!(stats.hi < 0.0);
        assert!(stats.significant);
        assert_eq!(stats.winner(), Some(Side::Baseline));
    }

    #[test]
    fn test_overlapping_samples_not_significant() {
        let interval = WelchInterval::default();
        let a = series(&[10.0, 12.0, 8.0, 11.0, 9.0]);
        let b = series(&[9.0, 11.0, 10.0, 12.0, 8.0]);

        let stats = interval.compute(1, &a, &b).unwrap();

        assert!(stats.lo <= 0.0 && stats.hi >= 0.0);
        assert!(!stats.significant);
        assert!(stats.winner().is_none());
    }

    #[test]
    fn test_identical_constant_samples_collapse_to_zero() {
        let interval = WelchInterval::default();
        let a = series(&[5.0, 5.0, 5.0]);
        let b = series(&[5.0, 5.0, 5.0]);

        let stats = interval.compute(1, &a, &b).unwrap();

        assert_eq!(stats.standard_error, 0.0);
        assert_eq!(stats.degrees_of_freedom, 2.0);
        assert_eq!(stats.lo, 0.0);
        assert_eq!(stats.hi, 0.0);
        assert!(!stats.significant);
    }

    #[test]
    fn test_distinct_constant_samples_are_significant() {
        let interval = WelchInterval::default();
        let a = series(&[10.0; 5]);
        let b = series(&[0.0; 5]);

        let stats = interval.compute(1, &a, &b).unwrap();

        assert_eq!(stats.degrees_of_freedom, 4.0);
        assert_eq!(stats.lo, 10.0);
        assert_eq!(stats.hi, 10.0);
        assert!(stats.significant);
    }

    #[test]
    fn test_relabeling_negates_interval() {
        let interval = WelchInterval::new(0.9);
        let a = series(&[231.0, 198.0, 254.0, 187.0, 302.0, 221.0]);
        let b = series(&[222.0, 201.0, 219.0, 240.0, 205.0, 199.0]);

        let forward = interval.compute(1, &a, &b).unwrap();
        let swapped = interval.compute(1, &b, &a).unwrap();

        assert_eq!(swapped.delta, -forward.delta);
        assert_eq!(swapped.lo, -forward.hi);
        assert_eq!(swapped.hi, -forward.lo);
        assert_eq!(swapped.significant, forward.significant);
        assert_eq!(swapped.winner(), forward.winner().map(Side::other));
    }

    #[test]
    fn test_insufficient_samples() {
        let interval = WelchInterval::default();
        let a = series(&[100.0]);
        let b = series(&[200.0]);
        assert!(interval.compute(1, &a, &b).is_none());
    }

    #[test]
    fn test_welch_df_equal_variances() {
        // Equal variances and sizes give df = 2(n-1)
        let df = WelchInterval::welch_satterthwaite_df(4.0, 10, 4.0, 10);
        assert!((df - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_welch_df_one_zero_variance() {
        // Only one side varies: df = n-1 of that side
        let df = WelchInterval::welch_satterthwaite_df(4.0, 10, 0.0, 10);
        assert!((df - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_critical_value_two_sided() {
        let interval = WelchInterval::new(0.95);
        assert!((interval.critical_value(4.0) - 2.776).abs() < 1e-3);
        assert!((interval.critical_value(1000.0) - 1.962).abs() < 1e-3);

        let interval = WelchInterval::new(0.99);
        assert!((interval.critical_value(10.0) - 3.169).abs() < 1e-3);
    }

    #[test]
    fn test_critical_value_huge_df_is_normal_quantile() {
        let interval = WelchInterval::new(0.95);
        for df in [4e6, 1e7, 3e7, 1e9, 1e10] {
            assert!((interval.critical_value(df) - 1.959964).abs() < 1e-5);
        }

        let interval = WelchInterval::new(0.99);
        assert!((interval.critical_value(1e9) - 2.575829).abs() < 1e-5);
    }

    #[test]
    fn test_critical_value_continuous_at_switch() {
        let interval = WelchInterval::new(0.95);
        let below = interval.critical_value(1e5);
        let above = interval.critical_value(1e5 + 1.0);
        assert!(below >= above);
        assert!(below - above < 1e-4);
    }

    #[test]
    fn test_long_run_interval_uses_normal_quantile() {
        // Welch df grows like 2(n - 1); a million samples per side is past the switch
        let mut a = SampleSeries::new();
        let mut b = SampleSeries::new();
        for i in 0..1_000_000 {
            let x = (i % 10) as f64;
            a.push(Sample::new(x + 0.01, 1.0));
            b.push(Sample::new(x, 1.0));
        }

        let stats = WelchInterval::new(0.95).compute(1, &a, &b).unwrap();
        assert!(stats.degrees_of_freedom > 1e6);
        assert!((stats.t_critical - 1.959964).abs() < 1e-5);
    }

    #[test]
    fn test_custom_confidence_level() {
        let interval = WelchInterval::new(0.99);
        assert_eq!(interval.confidence_level, 0.99);
    }

    #[test]
    #[should_panic(expected = "confidence_level must be between 0 and 1")]
    fn test_invalid_confidence_level() {
        WelchInterval::new(1.5);
    }
}
