//! Request loop for the engine harness.
//!
//! Reads one request line at a time, plays the requested games and writes one
//! sample line per game. Anything that is not a valid request is answered
//! with a `#` comment line, which the tester ignores as chatter.

use engine_hypothesis_core::protocol::format_sample;
use engine_hypothesis_core::BatchRequest;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::{GameRunner, HarnessError};

/// Answer batch requests until the reader reaches EOF.
///
/// Returns the number of batches served.
///
/// # Errors
///
/// Returns an error if reading a request or writing a sample fails.
pub async fn serve<R, W, G>(
    reader: R,
    mut writer: W,
    runner: &mut G,
) -> Result<usize, HarnessError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    G: GameRunner + ?Sized,
{
    let mut lines = reader.lines();
    let mut batches = 0;

    while let Some(line) = lines.next_line().await.map_err(HarnessError::Read)? {
        if line.trim().is_empty() {
            continue;
        }

        let request = match BatchRequest::parse(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "ignoring request");
                writer
                    .write_all(format!("# {}\n", e).as_bytes())
                    .await
                    .map_err(HarnessError::Write)?;
                writer.flush().await.map_err(HarnessError::Write)?;
                continue;
            }
        };

        debug!(games = request.games, "playing batch");
        for _ in 0..request.games {
            let sample = runner.play_game(&request);
            writer
                .write_all(format!("{}\n", format_sample(&sample)).as_bytes())
                .await
                .map_err(HarnessError::Write)?;
        }
        writer.flush().await.map_err(HarnessError::Write)?;
        batches += 1;
    }

    debug!(batches, "request stream closed");
    Ok(batches)
}

/// Serve requests on stdin and stdout.
///
/// Use this when you're already in a tokio runtime.
/// For standalone use, prefer `run_harness` which creates its own runtime.
pub async fn run_harness_async<G>(mut runner: G) -> Result<usize, HarnessError>
where
    G: GameRunner,
{
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(stdin, stdout, &mut runner).await
}

/// Serve requests on stdin and stdout until stdin is closed.
///
/// # Example
///
/// ```ignore
/// use engine_hypothesis_core::Sample;
/// use engine_hypothesis_harness::run_harness;
///
/// run_harness(|_request: &_| {
///     let (score, nodes_per_second) = play_one_game();
///     Sample::new(score, nodes_per_second)
/// })?;
/// ```
pub fn run_harness<G>(runner: G) -> anyhow::Result<usize>
where
    G: GameRunner,
{
    let runtime = tokio::runtime::Runtime::new()?;

    let batches = runtime.block_on(run_harness_async(runner))?;
    Ok(batches)
}
