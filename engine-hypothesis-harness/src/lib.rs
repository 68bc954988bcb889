//! Engine-side runtime for engine-hypothesis
//!
//! An engine under test reads batch requests on stdin and answers each with
//! one `<score> <throughput>` line per game. This crate implements that loop
//! so an engine only has to provide a [`GameRunner`].

mod mock;
mod server;

pub use mock::{MockEngine, MockEngineConfig};
pub use server::{run_harness, run_harness_async, serve};

use engine_hypothesis_core::{BatchRequest, Sample};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to read request: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to write samples: {0}")]
    Write(#[source] std::io::Error),
}

/// Something that plays one game on demand.
///
/// Called once per requested game, in order. The returned sample should be
/// valid (finite score, finite non-negative throughput); the tester rejects
/// the whole batch otherwise.
pub trait GameRunner: Send {
    fn play_game(&mut self, request: &BatchRequest) -> Sample;
}

impl<F> GameRunner for F
where
    F: FnMut(&BatchRequest) -> Sample + Send,
{
    fn play_game(&mut self, request: &BatchRequest) -> Sample {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_game_runner() {
        let mut played = 0;
        let mut runner = |request: &BatchRequest| {
            played += 1;
            Sample::new(request.games as f64, 100.0)
        };

        let sample = runner.play_game(&BatchRequest::new(3));
        assert_eq!(sample, Sample::new(3.0, 100.0));
        drop(runner);
        assert_eq!(played, 1);
    }
}
