//! External process execution.
//!
//! Every tool the release shells out to (build, signer, archiver, git,
//! notifier) goes through [`ProcessRunner`]. A run succeeds only on exit
//! status 0; anything else becomes a fatal error carrying the tool's status,
//! which the CLI turns into its own exit status.
//!
//! [`ProcessHandle`] is the lower-level piece: a spawned child whose combined
//! stdout/stderr is exposed as a lazy, finite, non-restartable sequence of
//! chunks, plus a blocking wait for exit bounded by the invocation timeout.

use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::error::{Error, ProcessFailedDetails, ProcessTimeoutDetails, Result};
use crate::utils::shell;

/// Default upper bound for a single tool invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// How often a silent child is checked for exit while output is drained.
const LIVENESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time allowed for in-flight output once the child has exited.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(50);

/// One external command: program, arguments, optional working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_dir: Option<PathBuf>,
    #[serde(skip)]
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: DEFAULT_TIMEOUT,
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

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shell-quoted command line, for logs and plans.
    pub fn display(&self) -> String {
        shell::command_line(&self.program, &self.args)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Runs external tools on behalf of pipeline stages.
pub trait ProcessRunner {
    /// Run to completion, streaming output. Non-zero exit or timeout is an error.
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Start a process and return without waiting for it.
    fn launch(&self, invocation: &Invocation) -> Result<()>;
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    TimedOut,
}

/// A running child process with streamed output.
pub struct ProcessHandle {
    invocation: Invocation,
    child: Child,
    chunks: Receiver<Vec<u8>>,
    /// `None` when the timeout is too large to represent.
    deadline: Option<Instant>,
    exit: Option<i32>,
    output_done: bool,
    timed_out: bool,
}

impl ProcessHandle {
    pub fn spawn(invocation: &Invocation) -> Result<Self> {
        let mut child = invocation
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::process_spawn_failed(&invocation.program, e.to_string()))?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            forward_pipe(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_pipe(stderr, tx);
        }

        Ok(Self {
            invocation: invocation.clone(),
            child,
            chunks: rx,
            deadline: Instant::now().checked_add(invocation.timeout),
            exit: None,
            output_done: false,
            timed_out: false,
        })
    }

    /// Output chunks in arrival order.
    ///
    /// Ends at end-of-stream, when the process has exited and its buffered
    /// output is drained (background children may keep the pipes open), or
    /// at the deadline. The sequence is consumed as it is read; once
    /// exhausted it stays empty.
    pub fn output(&mut self) -> OutputChunks<'_> {
        OutputChunks { handle: self }
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    fn poll_exit(&mut self) -> Result<Option<i32>> {
        if self.exit.is_none() {
            let status = self.child.try_wait().map_err(|e| self.wait_error(e))?;
            self.exit = status.map(exit_code);
        }
        Ok(self.exit)
    }

    fn wait_error(&self, e: io::Error) -> Error {
        Error::internal_io(
            e.to_string(),
            Some(format!("wait for {}", self.invocation.program)),
        )
    }

    /// Block until the process exits or the deadline passes.
    ///
    /// On timeout the child is killed.
    pub fn wait(mut self) -> Result<ExitOutcome> {
        if let Some(code) = self.exit {
            return Ok(ExitOutcome::Exited(code));
        }

        if !self.timed_out {
            let status = match self.remaining() {
                Some(remaining) => self.child.wait_timeout(remaining),
                None => self.child.wait().map(Some),
            };
            match status {
                Ok(Some(status)) => return Ok(ExitOutcome::Exited(exit_code(status))),
                Ok(None) => self.timed_out = true,
                Err(e) => return Err(self.wait_error(e)),
            }
        }

        // Kill errors mean the child already exited between checks.
        let _ = self.child.kill();
        let _ = self.child.wait();
        Ok(ExitOutcome::TimedOut)
    }
}

/// Lazy, finite iterator over a child's output.
pub struct OutputChunks<'a> {
    handle: &'a mut ProcessHandle,
}

impl OutputChunks<'_> {
    fn finish(&mut self) -> Option<Vec<u8>> {
        self.handle.output_done = true;
        None
    }
}

impl Iterator for OutputChunks<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let handle = &mut *self.handle;
            if handle.output_done {
                return None;
            }

            // Exited: only collect what the readers still have in flight.
            if handle.exit.is_some() {
                return match handle.chunks.recv_timeout(EXIT_DRAIN_GRACE) {
                    Ok(chunk) => Some(chunk),
                    Err(_) => self.finish(),
                };
            }

            let slice = match handle.remaining() {
                Some(remaining) if remaining.is_zero() => {
                    handle.timed_out = true;
                    return self.finish();
                }
                Some(remaining) => remaining.min(LIVENESS_POLL_INTERVAL),
                None => LIVENESS_POLL_INTERVAL,
            };

            match handle.chunks.recv_timeout(slice) {
                Ok(chunk) => return Some(chunk),
                Err(RecvTimeoutError::Disconnected) => return self.finish(),
                Err(RecvTimeoutError::Timeout) => {
                    // A failed liveness check falls back to the blocking wait.
                    if handle.poll_exit().is_err() {
                        return self.finish();
                    }
                }
            }
        }
    }
}

fn forward_pipe<R: Read + Send + 'static>(mut pipe: R, tx: Sender<Vec<u8>>) {
    thread::spawn(move || {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Run `invocation`, copying every output chunk to `out` as it arrives.
pub fn run_streaming<W: Write>(invocation: &Invocation, out: &mut W) -> Result<()> {
    log_status!("run", "{}", invocation.display());

    let mut handle = ProcessHandle::spawn(invocation)?;
    for chunk in handle.output() {
        // A closed stdout must not abort the release; the tool keeps running.
        let _ = out.write_all(&chunk).and_then(|_| out.flush());
    }

    match handle.wait()? {
        ExitOutcome::Exited(0) => Ok(()),
        ExitOutcome::Exited(code) => Err(Error::process_failed(ProcessFailedDetails {
            program: invocation.program.clone(),
            args: invocation.args.clone(),
            exit_code: code,
        })),
        ExitOutcome::TimedOut => Err(Error::process_timeout(ProcessTimeoutDetails {
            program: invocation.program.clone(),
            args: invocation.args.clone(),
            timeout_secs: invocation.timeout.as_secs(),
        })),
    }
}

/// Runs tools on the local machine, streaming their output to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        run_streaming(invocation, &mut handle)
    }

    fn launch(&self, invocation: &Invocation) -> Result<()> {
        log_status!("run", "{} (detached)", invocation.display());
        invocation
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| {
                Error::internal_io(
                    e.to_string(),
                    Some(format!("launch {}", invocation.program)),
                )
            })
    }
}
