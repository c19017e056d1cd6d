//! Execution sandbox for generated source.
//!
//! Source text runs in a separate interpreter process, never in the
//! orchestrator's own namespace. Each execution holds a [`CaptureSink`]: a
//! process-wide exclusive lease on the sandbox plus a scratch directory holding
//! the source, the runner script and the report channel. The lease and the
//! directory are released when the sink drops, on every exit path.
//!
//! This is process isolation with time and output limits. It is not a security
//! boundary: generated code can still touch the filesystem and the network
//! with the privileges of the current user.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::core::types::ExecutionOutcome;
use crate::io::config::SandboxConfig;
use crate::io::process::run_bounded;

const RUNNER_SCRIPT: &str = include_str!("sandbox_runner.py");
const RUNNER_FILE: &str = "runner.py";
const SOURCE_FILE: &str = "generated.py";
const CHANNEL_FILE: &str = "report.json";

/// Environment variables passed through to the interpreter. Everything else is cleared.
const PRESERVED_ENV: &[&str] = &["PATH", "SYSTEMROOT", "LANG", "LC_ALL"];

static EXECUTION_LOCK: Mutex<()> = Mutex::new(());

/// Exclusive, scoped resource for one execution.
pub struct CaptureSink {
    // Declared first so the scratch directory is removed before the lease is released.
    scratch: TempDir,
    _lease: MutexGuard<'static, ()>,
}

impl CaptureSink {
    /// Block until no other execution is in flight, then create a fresh scratch directory.
    pub fn acquire() -> Result<Self> {
        // A panic while holding the lease leaves nothing shared behind, so poisoning is ignored.
        let lease = EXECUTION_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let scratch = tempfile::Builder::new()
            .prefix("devteam-sandbox-")
            .tempdir()
            .context("create sandbox scratch directory")?;
        debug!(scratch = %scratch.path().display(), "capture sink acquired");
        Ok(Self {
            scratch,
            _lease: lease,
        })
    }

    pub fn dir(&self) -> &Path {
        self.scratch.path()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }

    /// Write the runner script and `source` into the scratch directory.
    fn stage(&self, source: &str) -> Result<()> {
        for (name, contents) in [(RUNNER_FILE, RUNNER_SCRIPT), (SOURCE_FILE, source)] {
            let path = self.path(name);
            fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        }
        Ok(())
    }

    /// Interpreter command confined to the scratch directory with a scrubbed environment.
    fn command(&self, interpreter: &[String]) -> Result<Command> {
        let (program, args) = interpreter
            .split_first()
            .ok_or_else(|| anyhow!("sandbox interpreter is empty"))?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(self.path(RUNNER_FILE))
            .arg(self.path(SOURCE_FILE))
            .arg(self.path(CHANNEL_FILE))
            .current_dir(self.dir())
            .env_clear();
        for key in PRESERVED_ENV {
            if let Some(value) = std::env::var_os(key) {
                cmd.env(key, value);
            }
        }
        Ok(cmd)
    }

    /// Read the runner's report, or `None` if the interpreter never wrote one.
    fn read_report(&self) -> Option<RunnerReport> {
        let path = self.path(CHANNEL_FILE);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(err = %e, "discarding malformed runner report");
                None
            }
        }
    }
}

impl Drop for CaptureSink {
    fn drop(&mut self) {
        debug!(scratch = %self.scratch.path().display(), "capture sink released");
    }
}

/// Report written by the runner script to the side channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunnerReport {
    pub ok: bool,
    #[serde(default)]
    pub has_result: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}

/// Everything observed about one interpreter run, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRun {
    pub timed_out: bool,
    pub timeout_secs: u64,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr_tail: Option<String>,
    pub report: Option<RunnerReport>,
}

/// Turn a raw interpreter run into an outcome.
///
/// A timeout always fails, even if the runner managed to write a report. A
/// missing report means the interpreter died outside the runner's control.
pub fn classify(run: RawRun) -> ExecutionOutcome {
    if run.timed_out {
        return ExecutionOutcome::failure(format!(
            "execution timed out after {}s",
            run.timeout_secs
        ));
    }
    match run.report {
        Some(report) if report.ok => {
            let result = report.has_result.then_some(report.result);
            ExecutionOutcome::success(run.stdout, result)
        }
        Some(report) => ExecutionOutcome::failure(
            report
                .error
                .unwrap_or_else(|| "execution failed without a description".to_string()),
        ),
        None => ExecutionOutcome::failure(match (run.stderr_tail, run.exit_code) {
            (Some(tail), _) => tail,
            (None, Some(code)) => format!("interpreter exited with status {code} without a report"),
            (None, None) => "interpreter was terminated by a signal".to_string(),
        }),
    }
}

/// Runs source text in a fresh interpreter and classifies the result.
#[derive(Debug, Clone)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute `source` and return its outcome.
    ///
    /// Faults inside the executed program are reported as a failed outcome.
    /// `Err` is reserved for host problems: no scratch directory, or an
    /// interpreter that cannot be spawned.
    #[instrument(skip_all, fields(source_bytes = source.len()))]
    pub fn execute(&self, source: &str) -> Result<ExecutionOutcome> {
        let sink = CaptureSink::acquire()?;
        sink.stage(source)?;
        let cmd = sink.command(&self.config.interpreter)?;
        let limits = self.config.limits();

        info!("executing generated source");
        let output = run_bounded(cmd, None, limits).context("run sandbox interpreter")?;
        let report = sink.read_report();
        drop(sink);

        let stderr = output.stderr_text();
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim_end(), "interpreter stderr");
        }
        let mut stdout = output.stdout_text();
        stdout.push_str(&output.stdout_truncated_notice("sandbox"));
        let outcome = classify(RawRun {
            timed_out: output.timed_out,
            timeout_secs: limits.timeout.as_secs(),
            exit_code: output.status.code(),
            stdout,
            stderr_tail: output.stderr_tail(),
            report,
        });
        debug!(
            succeeded = outcome.succeeded(),
            elapsed_ms = output.elapsed.as_millis() as u64,
            "execution classified"
        );
        Ok(outcome)
    }
}
