use super::Sample;

/// Running mean and sum of squared deviations (Welford's method).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Running {
    mean: f64,
    m2: f64,
}

impl Running {
    fn update(&mut self, value: f64, count: usize) {
        let delta = value - self.mean;
        self.mean += delta / count as f64;
        self.m2 += delta * (value - self.mean);
    }
}

/// The ordered series of samples collected from one engine.
///
/// The series only ever grows. Mean and variance always cover every sample
/// recorded so far and are maintained incrementally, so reading them is O(1)
/// and never mutates the series.
#[derive(Debug, Clone, Default)]
pub struct SampleSeries {
    samples: Vec<Sample>,
    score: Running,
    throughput: Running,
}

impl SampleSeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single sample.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
        let count = self.samples.len();
        self.score.update(sample.score, count);
        self.throughput.update(sample.throughput, count);
    }

    /// Append samples in order. An empty batch leaves the series untouched.
    pub fn extend<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = Sample>,
    {
        for sample in samples {
            self.push(sample);
        }
    }

    /// Number of samples recorded so far.
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples in the order they were recorded.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sample mean of the scores, or `None` with fewer than two samples.
    pub fn mean(&self) -> Option<f64> {
        self.has_statistics().then_some(self.score.mean)
    }

    /// Unbiased sample variance of the scores (n-1 denominator).
    ///
    /// Returns `None` with fewer than two samples, where the variance is undefined.
    pub fn variance(&self) -> Option<f64> {
        self.has_statistics()
            .then(|| self.score.m2 / (self.samples.len() - 1) as f64)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Mean throughput across all recorded games.
    pub fn throughput_mean(&self) -> Option<f64> {
        self.has_statistics().then_some(self.throughput.mean)
    }

    fn has_statistics(&self) -> bool {
        self.samples.len() >= 2
    }
}
