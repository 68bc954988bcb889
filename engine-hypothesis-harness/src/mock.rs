use engine_hypothesis_core::{BatchRequest, Sample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::GameRunner;

/// Parameters of a synthetic engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MockEngineConfig {
    /// Mean score per game.
    pub mean: f64,
    /// Scores are drawn uniformly from `mean ± spread`.
    pub spread: f64,
    /// Throughput per search thread.
    pub throughput: f64,
    /// Seed for reproducible runs; random if `None`.
    pub seed: Option<u64>,
}

impl Default for MockEngineConfig {
    fn default() -> Self {
        Self {
            mean: 0.0,
            spread: 100.0,
            throughput: 1_000_000.0,
            seed: None,
        }
    }
}

/// A game runner producing random scores around a fixed mean.
///
/// Throughput scales with the thread count carried by positional requests
/// and jitters by up to 5%.
#[derive(Debug)]
pub struct MockEngine {
    config: MockEngineConfig,
    rng: StdRng,
}

impl MockEngine {
    pub fn new(config: MockEngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &MockEngineConfig {
        &self.config
    }
}

impl GameRunner for MockEngine {
    fn play_game(&mut self, request: &BatchRequest) -> Sample {
        let spread = self.config.spread.abs();
        let score = if spread > 0.0 {
            self.config.mean + self.rng.gen_range(-spread..=spread)
        } else {
            self.config.mean
        };

        let threads = f64::from(request.threads.unwrap_or(1));
        let jitter = self.rng.gen_range(0.95..=1.05);
        let throughput = (self.config.throughput * threads * jitter).max(0.0);

        Sample::new(score, throughput)
    }
}
