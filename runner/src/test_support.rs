//! Test-only helpers for driving the execution loop without real processes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio_util::sync::CancellationToken;

use crate::core::command::TracerPrefix;
use crate::core::types::{NetCounters, ProcessUsage, TraceFlags};
use crate::io::executor::{ExecOutcome, ExecRequest, Executor};
use crate::io::probe::ResourceProbe;
use crate::looping::SessionConfig;

/// A session over `command` writing artifacts into `dir`, with one repeat and
/// every trace flag off.
pub fn session_config(command: &[&str], dir: &Path) -> SessionConfig {
    SessionConfig {
        command: command.iter().map(|token| token.to_string()).collect(),
        repeat_count: 1,
        failure_budget: None,
        trace: TraceFlags::default(),
        net_trace: false,
        artifact_dir: dir.to_path_buf(),
        tracer: TracerPrefix {
            argv: vec!["strace".to_string(), "-f".to_string()],
            output_flag: "-o".to_string(),
        },
        output_limit_bytes: 1024 * 1024,
        poll_interval: Duration::from_millis(10),
    }
}

/// An outcome for a child that exited with `code` and printed nothing.
pub fn exited(code: i32) -> ExecOutcome {
    ExecOutcome {
        exit_code: code,
        stdout: String::new(),
        stderr: String::new(),
        spawn_failed: false,
        cancelled: false,
        peak_rss_kib: None,
    }
}

/// One scripted step: what to return, and what to do while "running".
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub outcome: ExecOutcome,
    /// Cancel the session token while this run is in flight.
    pub cancel_during: bool,
    /// Cancel the session token this long after the run has returned, the
    /// way a signal listener thread lags behind a child killed by Ctrl-C.
    pub cancel_after: Option<Duration>,
}

impl From<ExecOutcome> for ScriptedRun {
    fn from(outcome: ExecOutcome) -> Self {
        Self {
            outcome,
            cancel_during: false,
            cancel_after: None,
        }
    }
}

/// Executor that replays scripted outcomes in order.
///
/// When the argv carries a tracer `-o <path>` prefix, it writes a placeholder
/// log there, like a real tracer would.
pub struct ScriptedExecutor {
    script: RefCell<VecDeque<ScriptedRun>>,
    repeat: Option<ScriptedRun>,
    requests: RefCell<Vec<ExecRequest>>,
}

impl ScriptedExecutor {
    pub fn new<R: Into<ScriptedRun>>(runs: Vec<R>) -> Self {
        Self {
            script: RefCell::new(runs.into_iter().map(Into::into).collect()),
            repeat: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Return the same outcome for every call.
    pub fn repeating<R: Into<ScriptedRun>>(run: R) -> Self {
        Self {
            script: RefCell::new(VecDeque::new()),
            repeat: Some(run.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<ExecRequest> {
        self.requests.borrow().clone()
    }
}

impl Executor for ScriptedExecutor {
    fn exec(&self, request: &ExecRequest, cancel: &CancellationToken) -> Result<ExecOutcome> {
        self.requests.borrow_mut().push(request.clone());
        let run = match self.script.borrow_mut().pop_front() {
            Some(run) => run,
            None => self
                .repeat
                .clone()
                .ok_or_else(|| anyhow!("scripted executor exhausted"))?,
        };
        if let Some(log) = tracer_log_path(request) {
            fs::write(&log, "execve(...) = 0\n")?;
        }
        if run.cancel_during {
            cancel.cancel();
        }
        if let Some(delay) = run.cancel_after {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(delay);
                cancel.cancel();
            });
        }
        Ok(run.outcome)
    }
}

fn tracer_log_path(request: &ExecRequest) -> Option<PathBuf> {
    let position = request.argv.iter().position(|arg| arg == "-o")?;
    request.argv.get(position + 1).map(PathBuf::from)
}

/// Probe that returns the same counters on every sample.
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    pub net: NetCounters,
    pub usage: ProcessUsage,
    pub mem_total_kib: u64,
}

impl ResourceProbe for FixedProbe {
    fn sample_host(&self) -> Result<NetCounters> {
        Ok(self.net)
    }

    fn sample_process(&self) -> Result<ProcessUsage> {
        Ok(self.usage)
    }

    fn mem_total_kib(&self) -> Result<u64> {
        Ok(self.mem_total_kib)
    }
}

/// Probe that replays process usage samples in order, repeating the last one.
///
/// Host counters and memory size stay fixed.
pub struct SequenceProbe {
    usages: RefCell<VecDeque<ProcessUsage>>,
    last: RefCell<ProcessUsage>,
    pub mem_total_kib: u64,
}

impl SequenceProbe {
    pub fn new(usages: Vec<ProcessUsage>, mem_total_kib: u64) -> Self {
        Self {
            usages: RefCell::new(usages.into()),
            last: RefCell::new(ProcessUsage::default()),
            mem_total_kib,
        }
    }
}

impl ResourceProbe for SequenceProbe {
    fn sample_host(&self) -> Result<NetCounters> {
        Ok(NetCounters::default())
    }

    fn sample_process(&self) -> Result<ProcessUsage> {
        if let Some(usage) = self.usages.borrow_mut().pop_front() {
            *self.last.borrow_mut() = usage;
        }
        Ok(*self.last.borrow())
    }

    fn mem_total_kib(&self) -> Result<u64> {
        Ok(self.mem_total_kib)
    }
}
