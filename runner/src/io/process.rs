//! Helpers for running child processes with cancellation and bounded output.

use std::fs;
use std::io::{self, Read};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::classifier::exit_code_from_parts;
use crate::core::procfs::parse_vm_hwm_kib;

/// The child could not be started at all.
#[derive(Debug, Error)]
#[error("spawn command: {0}")]
pub struct SpawnError(#[source] pub io::Error);

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    /// The child was killed because cancellation was requested.
    pub cancelled: bool,
    /// Highest `VmHWM` seen while polling the running child, if it lived
    /// long enough to be sampled.
    pub peak_rss_kib: Option<u64>,
}

impl CommandOutput {
    /// Exit code with signal terminations folded into `128 + signal`.
    pub fn exit_code(&self) -> i32 {
        exit_code_from_parts(self.status.code(), self.status.signal())
    }
}

/// Run a command to completion, capturing stdout/stderr without risking pipe deadlocks.
///
/// The child has no time limit. While it runs, `cancel` is checked every
/// `poll_interval`; once cancelled the child is killed and reaped before
/// returning. Spawn errors are returned as [`SpawnError`] so callers can tell
/// them apart from failures while waiting on a running child.
#[instrument(skip_all, fields(output_limit_bytes, poll_ms = poll_interval.as_millis() as u64))]
pub fn run_command(
    mut cmd: Command,
    output_limit_bytes: usize,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = cmd.spawn().map_err(SpawnError)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let waited = wait_or_cancel(&mut child, poll_interval, cancel)?;

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(
        exit_code = ?waited.status.code(),
        signal = ?waited.status.signal(),
        cancelled = waited.cancelled,
        peak_rss_kib = ?waited.peak_rss_kib,
        "command finished"
    );
    Ok(CommandOutput {
        status: waited.status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        cancelled: waited.cancelled,
        peak_rss_kib: waited.peak_rss_kib,
    })
}

struct Waited {
    status: ExitStatus,
    cancelled: bool,
    peak_rss_kib: Option<u64>,
}

fn wait_or_cancel(
    child: &mut Child,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<Waited> {
    let mut peak_rss_kib = None;
    loop {
        if let Some(status) = child
            .wait_timeout(poll_interval)
            .context("wait for command")?
        {
            return Ok(Waited {
                status,
                cancelled: false,
                peak_rss_kib,
            });
        }
        peak_rss_kib = peak_rss_kib.max(read_vm_hwm_kib(child.id()));
        if cancel.is_cancelled() {
            warn!(pid = child.id(), "cancellation requested, killing child");
            // The child may exit between the poll and the kill.
            if let Err(err) = child.kill() {
                debug!(err = %err, "kill after cancellation failed");
            }
            let status = child.wait().context("wait command after kill")?;
            return Ok(Waited {
                status,
                cancelled: true,
                peak_rss_kib,
            });
        }
    }
}

/// Peak resident set size of a live, unreaped child.
fn read_vm_hwm_kib(pid: u32) -> Option<u64> {
    let contents = fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    parse_vm_hwm_kib(&contents).ok()
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
