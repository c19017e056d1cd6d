//! Child process execution with a deadline and bounded output capture.
//!
//! Both the command-line generator backend and the sandbox go through
//! [`run_bounded`], so timeouts and truncation behave the same everywhere.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to one child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    pub timeout: Duration,
    /// Bytes kept per stream; the rest is drained and counted.
    pub output_limit_bytes: usize,
}

/// What a finished (or killed) child left behind.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Marker appended to captured stdout when bytes were dropped, empty otherwise.
    pub fn stdout_truncated_notice(&self, label: &str) -> String {
        if self.stdout_truncated > 0 {
            format!(
                "\n[{label} stdout truncated {} bytes]\n",
                self.stdout_truncated
            )
        } else {
            String::new()
        }
    }

    /// Last non-blank stderr line, which for most interpreters names the fault.
    pub fn stderr_tail(&self) -> Option<String> {
        self.stderr_text()
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }
}

/// How long to keep reading after the child is gone. Anything still holding the
/// pipes past this point has escaped the process group.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Spawn `cmd`, feed it `stdin`, and collect its output within `limits`.
///
/// stdout and stderr are drained on reader threads while the child runs, and
/// stdin is written from its own thread, so a chatty child can never block on
/// a full pipe. A child that outlives `limits.timeout` is killed and reported
/// with `timed_out = true` rather than as an error.
///
/// On unix the child leads its own process group. The whole group is killed
/// once the child has been reaped, so background processes it started cannot
/// keep the output pipes open.
#[instrument(skip_all, fields(
    program = ?cmd.get_program(),
    timeout_secs = limits.timeout.as_secs(),
    output_limit_bytes = limits.output_limit_bytes,
))]
pub fn run_bounded(
    mut cmd: Command,
    stdin: Option<Vec<u8>>,
    limits: ProcessLimits,
) -> Result<ProcessOutput> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

    let started = Instant::now();
    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).with_context(|| format!("spawn {:?}", cmd.get_program()));
        }
    };

    let stdin_handle = match stdin {
        Some(input) => {
            let mut pipe = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            Some(thread::spawn(move || -> Result<()> {
                pipe.write_all(&input).context("write stdin")?;
                Ok(())
            }))
        }
        None => None,
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let stdout_reader = StreamReader::spawn(stdout, limits.output_limit_bytes);
    let stderr_reader = StreamReader::spawn(stderr, limits.output_limit_bytes);

    let mut timed_out = false;
    let status = match child.wait_timeout(limits.timeout).context("wait for child")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = limits.timeout.as_secs(),
                "child timed out, killing"
            );
            timed_out = true;
            if !kill_group(child.id()) {
                child.kill().context("kill child")?;
            }
            child.wait().context("wait child after kill")?
        }
    };
    if !timed_out {
        kill_group(child.id());
    }

    if let Some(handle) = stdin_handle {
        match handle.join() {
            // A child that exits without reading its input closes the pipe early.
            Ok(Err(e)) => debug!(err = %e, "stdin not fully consumed"),
            Ok(Ok(())) => {}
            Err(_) => return Err(anyhow!("stdin writer thread panicked")),
        }
    }
    let deadline = Instant::now() + READER_GRACE;
    let (stdout, stdout_truncated) = stdout_reader.finish(deadline).context("join stdout")?;
    let (stderr, stderr_truncated) = stderr_reader.finish(deadline).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "child output truncated");
    }

    let elapsed = started.elapsed();
    debug!(exit_code = ?status.code(), timed_out, elapsed_ms = elapsed.as_millis() as u64, "child finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
        elapsed,
    })
}

/// SIGKILL every process in the group led by `pgid`. Returns whether the signal was delivered.
#[cfg(unix)]
fn kill_group(pgid: u32) -> bool {
    // The shell builtin accepts a negative pid; no extra binary or unsafe call needed.
    let delivered = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -KILL -{pgid} 2>/dev/null"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if delivered {
        debug!(pgid, "killed process group");
    }
    delivered
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) -> bool {
    false
}

#[derive(Debug, Default)]
struct Drained {
    kept: Vec<u8>,
    dropped: usize,
}

/// Background reader for one output pipe. Bytes land in a shared buffer as
/// they arrive, so a reader that never sees EOF still yields what it read.
struct StreamReader {
    buf: Arc<Mutex<Drained>>,
    done: mpsc::Receiver<Result<()>>,
}

impl StreamReader {
    fn spawn<R: Read + Send + 'static>(reader: R, limit: usize) -> Self {
        let buf = Arc::new(Mutex::new(Drained::default()));
        let (tx, done) = mpsc::channel();
        let shared = Arc::clone(&buf);
        thread::spawn(move || {
            // The receiver may have given up already.
            let _ = tx.send(drain_limited(reader, &shared, limit));
        });
        Self { buf, done }
    }

    fn finish(self, deadline: Instant) -> Result<(Vec<u8>, usize)> {
        let wait = deadline.saturating_duration_since(Instant::now());
        match self.done.recv_timeout(wait) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => {
                warn!("output pipe still open after child exit, keeping partial output");
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow!("output reader thread panicked"));
            }
        }
        let mut drained = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        Ok((std::mem::take(&mut drained.kept), drained.dropped))
    }
}

fn drain_limited<R: Read>(mut reader: R, buf: &Mutex<Drained>, limit: usize) -> Result<()> {
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read child output")?;
        if n == 0 {
            break;
        }
        let mut drained = buf.lock().unwrap_or_else(PoisonError::into_inner);
        let room = limit.saturating_sub(drained.kept.len());
        let keep = n.min(room);
        drained.kept.extend_from_slice(&chunk[..keep]);
        drained.dropped += n - keep;
    }

    Ok(())
}
