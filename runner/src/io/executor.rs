//! Executor abstraction for target command invocations.
//!
//! The [`Executor`] trait decouples the execution loop from actually spawning
//! processes. Tests use scripted executors that return predetermined outcomes
//! without touching the OS.

use std::ffi::OsString;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::classifier::SPAWN_FAILURE_EXIT_CODE;
use crate::io::process::{SpawnError, run_command};

/// Parameters for one invocation.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Run index within the session (0-based).
    pub index: u32,
    /// Full argv, already wrapped by the tracer prefix when call tracing.
    pub argv: Vec<OsString>,
    /// Per-stream cap on captured output.
    pub output_limit_bytes: usize,
    /// How often to check for cancellation while the child runs.
    pub poll_interval: Duration,
}

/// What one invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// The program could not be started; `exit_code` is the spawn sentinel.
    pub spawn_failed: bool,
    /// The executor stopped waiting because cancellation was requested.
    pub cancelled: bool,
    /// Peak resident set size of the invoked process itself, when observed.
    pub peak_rss_kib: Option<u64>,
}

impl ExecOutcome {
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self {
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: message.into(),
            spawn_failed: true,
            cancelled: false,
            peak_rss_kib: None,
        }
    }
}

/// Abstraction over invocation backends.
pub trait Executor {
    /// Run one invocation to completion or cancellation.
    ///
    /// A program that cannot be spawned is an `Ok` outcome with
    /// `spawn_failed` set, not an error. Errors are reserved for failures of
    /// the executor itself (e.g. waiting on the child).
    fn exec(&self, request: &ExecRequest, cancel: &CancellationToken) -> Result<ExecOutcome>;
}

/// Executor that spawns the argv as a child process.
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    #[instrument(skip_all, fields(index = request.index))]
    fn exec(&self, request: &ExecRequest, cancel: &CancellationToken) -> Result<ExecOutcome> {
        let (program, args) = request
            .argv
            .split_first()
            .ok_or_else(|| anyhow!("empty argv for run {}", request.index))?;
        info!(program = %program.to_string_lossy(), "starting invocation");

        let mut cmd = Command::new(program);
        cmd.args(args);

        let output = match run_command(
            cmd,
            request.output_limit_bytes,
            request.poll_interval,
            cancel,
        ) {
            Ok(output) => output,
            Err(err) => match err.downcast_ref::<SpawnError>() {
                Some(SpawnError(io_err)) => {
                    warn!(err = %io_err, program = %program.to_string_lossy(), "failed to spawn command");
                    return Ok(ExecOutcome::spawn_failure(format!(
                        "{}: {}",
                        program.to_string_lossy(),
                        io_err
                    )));
                }
                None => return Err(err),
            },
        };

        let exit_code = output.exit_code();
        debug!(exit_code, cancelled = output.cancelled, "invocation finished");
        Ok(ExecOutcome {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            spawn_failed: false,
            cancelled: output.cancelled,
            peak_rss_kib: output.peak_rss_kib,
        })
    }
}
