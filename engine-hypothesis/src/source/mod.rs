use std::future::Future;

use engine_hypothesis_core::{BatchError, Sample};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Engine command is empty")]
    EmptyCommand,
    #[error("Invalid engine command (unbalanced quotes?): {0}")]
    InvalidCommand(String),
    #[error("Failed to spawn engine '{0}': {1}")]
    Spawn(String, String),
}

/// Something that plays games on request and reports one sample per game.
///
/// A successful call returns exactly `count` samples. Anything else is either
/// an explicit [`BatchError`] or a contract violation the tester reports as a
/// data error.
pub trait BatchSource: Send {
    fn request_batch(
        &mut self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<Sample>, BatchError>> + Send;
}

mod process;
pub use process::{EngineCommand, EngineConnection, EngineProcess};
