//! Batch sources backed by engine processes speaking the line protocol.

use std::process::Stdio;
use std::time::Duration;

use engine_hypothesis_core::protocol::parse_sample_line;
use engine_hypothesis_core::{BatchError, RequestFormat, Sample};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, trace};

use super::{BatchSource, SourceError};

/// Program and arguments used to start an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    /// Split a command line such as `"./my engine" -t 10` with shell quoting rules.
    pub fn parse(command_line: &str) -> Result<Self, SourceError> {
        let parts = shlex::split(command_line)
            .ok_or_else(|| SourceError::InvalidCommand(command_line.to_string()))?;
        let mut parts = parts.into_iter();
        let program = parts.next().ok_or(SourceError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// A line-protocol conversation with an engine over any pair of async streams.
pub struct EngineConnection<W, R> {
    /// Name used in logs and error messages.
    label: String,
    writer: W,
    reader: R,
    format: RequestFormat,
    /// Upper bound on the time a whole batch may take.
    timeout: Option<Duration>,
}

impl<W, R> EngineConnection<W, R>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(label: impl Into<String>, writer: W, reader: R, format: RequestFormat) -> Self {
        Self {
            label: label.into(),
            writer,
            reader,
            format,
            timeout: None,
        }
    }

    /// Fail batches that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    async fn send_request(&mut self, count: usize) -> Result<(), BatchError> {
        let request = self.format.render(count);
        debug!(engine = %self.label, %request, "sending batch request");

        let io_error = |e: std::io::Error| BatchError::Io(format!("writing request: {}", e));
        self.writer
            .write_all(format!("{}\n", request).as_bytes())
            .await
            .map_err(io_error)?;
        self.writer.flush().await.map_err(io_error)
    }

    /// Read lines until `count` samples arrive, skipping engine chatter.
    async fn read_samples(&mut self, count: usize) -> Result<Vec<Sample>, BatchError> {
        let mut samples = Vec::with_capacity(count);
        let mut line = String::new();

        while samples.len() < count {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(|e| BatchError::Io(format!("reading output: {}", e)))?;

            if read == 0 {
                return Err(BatchError::Exhausted(format!(
                    "{} closed its output after {} of {} games",
                    self.label,
                    samples.len(),
                    count
                )));
            }

            match parse_sample_line(&line) {
                Ok(Some(sample)) => samples.push(sample),
                Ok(None) => trace!(engine = %self.label, line = line.trim_end(), "ignoring output"),
                Err(e) => return Err(BatchError::Malformed(e.to_string())),
            }
        }

        Ok(samples)
    }

    async fn exchange(&mut self, count: usize) -> Result<Vec<Sample>, BatchError> {
        self.send_request(count).await?;
        self.read_samples(count).await
    }
}

impl<W, R> BatchSource for EngineConnection<W, R>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncBufRead + Unpin + Send,
{
    async fn request_batch(&mut self, count: usize) -> Result<Vec<Sample>, BatchError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(count))
                .await
                .map_err(|_| BatchError::Timeout(limit))?,
            None => self.exchange(count).await,
        }
    }
}

/// An engine subprocess driven through its stdin and stdout.
///
/// The process is killed when the handle is dropped.
pub struct EngineProcess {
    child: Child,
    connection: EngineConnection<ChildStdin, BufReader<ChildStdout>>,
}

impl EngineProcess {
    /// Spawn an engine process.
    ///
    /// # Arguments
    ///
    /// * `label` - Name used in logs and error messages
    /// * `command` - Program and arguments to run
    /// * `format` - How batch requests are written
    /// * `timeout` - Optional limit on the duration of a batch
    /// * `show_stderr` - Forward the engine's stderr instead of discarding it
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    pub fn spawn(
        label: &str,
        command: &EngineCommand,
        format: RequestFormat,
        timeout: Option<Duration>,
        show_stderr: bool,
    ) -> Result<Self, SourceError> {
        let spawn_error = |reason: String| SourceError::Spawn(command.program.clone(), reason);

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if show_stderr {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);
        // A terminal Ctrl-C must reach only the tester, which then stops the engines itself
        #[cfg(unix)]
        process.process_group(0);

        let mut child = process.spawn().map_err(|e| spawn_error(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_error("stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error("stdout was not captured".to_string()))?;

        debug!(engine = label, pid = ?child.id(), program = %command.program, "spawned engine");

        Ok(Self {
            child,
            connection: EngineConnection::new(label, stdin, BufReader::new(stdout), format)
                .with_timeout(timeout),
        })
    }

    /// Get the process ID of the engine, if it is still running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Close the engine's stdin and wait briefly for it to exit, then kill it.
    pub async fn shutdown(self) {
        let Self {
            mut child,
            connection,
        } = self;
        let label = connection.label().to_string();
        drop(connection);

        match tokio::time::timeout(Duration::from_millis(500), child.wait()).await {
            Ok(status) => debug!(engine = %label, ?status, "engine exited"),
            Err(_) => {
                debug!(engine = %label, "engine did not exit, killing");
                let _ = child.kill().await;
            }
        }
    }
}

impl BatchSource for EngineProcess {
    fn request_batch(
        &mut self,
        count: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Sample>, BatchError>> + Send {
        self.connection.request_batch(count)
    }
}
