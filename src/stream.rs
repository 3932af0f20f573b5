//! Streaming command execution.
//!
//! Runs an external program and forwards its stdout to a [`LineSink`] line by
//! line as it is produced. Every read is bounded by a timeout; a stalled
//! process is killed. stderr is delivered after stdout ends. Nothing is ever
//! returned to the caller: launch failures, timeouts and I/O faults all end
//! up as lines in the sink.

use std::fmt;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::sink::LineSink;

/// Line pushed when a read stalls past the timeout
pub const TIMEOUT_LINE: &str = "[timeout] command exceeded timeout";

/// Line pushed when output has ended but the process will not exit
pub const EXIT_TIMEOUT_LINE: &str = "[timeout] process did not exit after output ended";

/// Program plus literal argument vector. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Failures surfaced to the sink. `Display` is the exact line pushed.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Command not found: {0}")]
    NotFound(String),
    #[error("Error running command: {0}")]
    Io(#[from] io::Error),
}

/// How the stdout pump ended
#[derive(Debug)]
enum ReadOutcome {
    Eof,
    TimedOut,
    Failed(io::Error),
}

/// Run `command`, streaming its output into `sink`.
///
/// `read_timeout` bounds each individual stdout read, not the whole run, so a
/// slow but steady producer (traceroute walking hops) can run indefinitely.
/// The child is guaranteed not to outlive this call.
pub async fn stream_command<S>(command: &CommandLine, sink: &S, read_timeout: Duration)
where
    S: LineSink + ?Sized,
{
    let child = match spawn(command) {
        Ok(child) => child,
        Err(e) => {
            debug!(command = %command, error = %e, "spawn failed");
            sink.push(e.to_string());
            return;
        }
    };
    debug!(command = %command, pid = ?child.id(), "spawned");

    // Kills the child if we leave this scope while it is still running,
    // including when the surrounding task is dropped mid-await.
    let mut child = scopeguard::guard(child, |mut child: Child| {
        if let Ok(None) = child.try_wait() {
            warn!(pid = ?child.id(), "run ended with child still alive, killing");
            let _ = child.start_kill();
        }
    });

    // stderr is collected from the start so a chatty process cannot fill the
    // pipe and stall on it while we are waiting for stdout.
    let stderr_task = child.stderr.take().map(collect_stderr);

    let outcome = match child.stdout.take() {
        Some(stdout) => forward_lines(stdout, sink, read_timeout).await,
        None => ReadOutcome::Failed(io::Error::other("stdout was not captured")),
    };

    let mut killed = false;
    match outcome {
        ReadOutcome::Eof => {}
        ReadOutcome::TimedOut => {
            warn!(command = %command, ?read_timeout, "no output within timeout, killing");
            kill(&mut child).await;
            killed = true;
            sink.push(TIMEOUT_LINE.to_string());
        }
        ReadOutcome::Failed(e) => {
            sink.push(StreamError::Io(e).to_string());
        }
    }

    if !killed {
        match timeout(read_timeout, child.wait()).await {
            Ok(Ok(status)) => debug!(command = %command, %status, "exited"),
            Ok(Err(e)) => warn!(command = %command, error = %e, "wait failed"),
            Err(_) => {
                warn!(command = %command, "stdout closed but process kept running, killing");
                kill(&mut child).await;
                sink.push(EXIT_TIMEOUT_LINE.to_string());
            }
        }
    }

    if let Some(task) = stderr_task {
        drain_stderr(task, sink, read_timeout).await;
    }
}

fn spawn(command: &CommandLine) -> Result<Child, StreamError> {
    Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StreamError::NotFound(command.program.clone()),
            _ => StreamError::Io(e),
        })
}

/// Push each line of `reader` until EOF, a stalled read, or an I/O error
async fn forward_lines<R, S>(reader: R, sink: &S, read_timeout: Duration) -> ReadOutcome
where
    R: AsyncRead + Unpin,
    S: LineSink + ?Sized,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match timeout(read_timeout, reader.read_until(b'\n', &mut buf)).await {
            Ok(Ok(0)) => return ReadOutcome::Eof,
            Ok(Ok(_)) => sink.push(decode_line(&buf)),
            Ok(Err(e)) => return ReadOutcome::Failed(e),
            Err(_) => {
                // read_until keeps bytes read before cancellation in `buf`
                if !buf.is_empty() {
                    sink.push(decode_line(&buf));
                }
                return ReadOutcome::TimedOut;
            }
        }
    }
}

/// Lossy UTF-8 decode with trailing whitespace (and the newline) removed
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

fn collect_stderr(mut stderr: ChildStderr) -> JoinHandle<io::Result<Vec<u8>>> {
    tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

async fn drain_stderr<S>(mut task: JoinHandle<io::Result<Vec<u8>>>, sink: &S, read_timeout: Duration)
where
    S: LineSink + ?Sized,
{
    match timeout(read_timeout, &mut task).await {
        Ok(Ok(Ok(bytes))) => {
            for line in String::from_utf8_lossy(&bytes).lines() {
                sink.push(line.to_string());
            }
        }
        Ok(Ok(Err(e))) => sink.push(StreamError::Io(e).to_string()),
        Ok(Err(e)) => warn!(error = %e, "stderr reader task failed"),
        Err(_) => {
            // A descendant inherited the pipe and is keeping it open
            warn!("stderr still open after process ended, abandoning drain");
            task.abort();
        }
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill failed (process likely already exited)");
    }
}
