//! Line protocol spoken between the tester and an engine process.
//!
//! The tester writes one request line per batch to the engine's stdin. The
//! engine answers with one `<score> <throughput>` line per finished game on
//! stdout. Any other output line is treated as chatter and ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::Sample;

/// Errors raised while encoding or decoding protocol lines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// A request line could not be understood.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A response line looked like a sample but violates the sample invariants.
    #[error("Invalid sample line: {0}")]
    InvalidSample(String),
}

/// How batch requests are written to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStyle {
    /// `-g <games>` followed by any configured extra arguments.
    #[default]
    Flags,
    /// `<games> <ms_per_move> <threads>`.
    Positional,
}

/// Request for the engine to play a number of games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRequest {
    /// Number of games to play.
    pub games: usize,
    /// Thinking time per move in milliseconds, if the request carries one.
    pub ms_per_move: Option<u32>,
    /// Search threads, if the request carries them.
    pub threads: Option<u32>,
}

impl BatchRequest {
    /// Create a request for `games` games with engine defaults for everything else.
    pub fn new(games: usize) -> Self {
        Self {
            games,
            ms_per_move: None,
            threads: None,
        }
    }

    /// Parse a request line in either style.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [] => Err(ProtocolError::InvalidRequest("empty request".to_string())),
            ["-g", games, ..] => Ok(Self::new(parse_games(games)?)),
            [games] => Ok(Self::new(parse_games(games)?)),
            [games, ms_per_move, threads] => Ok(Self {
                games: parse_games(games)?,
                ms_per_move: Some(parse_positive(ms_per_move, "ms_per_move")?),
                threads: Some(parse_positive(threads, "threads")?),
            }),
            _ => Err(ProtocolError::InvalidRequest(line.trim().to_string())),
        }
    }
}

fn parse_games(token: &str) -> Result<usize, ProtocolError> {
    match token.parse::<usize>() {
        Ok(games) if games > 0 => Ok(games),
        _ => Err(ProtocolError::InvalidRequest(format!(
            "game count must be a positive integer, got '{}'",
            token
        ))),
    }
}

fn parse_positive(token: &str, what: &str) -> Result<u32, ProtocolError> {
    match token.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ProtocolError::InvalidRequest(format!(
            "{} must be a positive integer, got '{}'",
            what, token
        ))),
    }
}

/// Encoder for request lines, configured once per engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFormat {
    pub style: RequestStyle,
    /// Extra arguments appended to `flags` requests.
    pub extra_args: Vec<String>,
    /// Thinking time sent with `positional` requests.
    pub ms_per_move: u32,
    /// Thread count sent with `positional` requests.
    pub threads: u32,
}

impl RequestFormat {
    /// Render the request line for a batch of `games`, without the trailing newline.
    pub fn render(&self, games: usize) -> String {
        match self.style {
            RequestStyle::Flags => {
                let mut line = format!("-g {}", games);
                for arg in &self.extra_args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            }
            RequestStyle::Positional => {
                format!("{} {} {}", games, self.ms_per_move, self.threads)
            }
        }
    }
}

/// Decode one line of engine output.
///
/// Returns `Ok(Some(sample))` for a `<score> <throughput>` line, `Ok(None)` for
/// chatter, and an error for a numeric pair that is not a valid sample.
pub fn parse_sample_line(line: &str) -> Result<Option<Sample>, ProtocolError> {
    let mut tokens = line.split_whitespace();
    let (Some(score), Some(throughput), None) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Ok(None);
    };

    let (Ok(score), Ok(throughput)) = (score.parse::<f64>(), throughput.parse::<f64>()) else {
        return Ok(None);
    };

    let sample = Sample::new(score, throughput);
    if sample.is_valid() {
        Ok(Some(sample))
    } else {
        Err(ProtocolError::InvalidSample(line.trim().to_string()))
    }
}

/// Encode a sample as a response line, without the trailing newline.
pub fn format_sample(sample: &Sample) -> String {
    format!("{} {}", sample.score, sample.throughput)
}
