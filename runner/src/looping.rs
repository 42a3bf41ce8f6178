//! The execution loop: run a command N times, tracing only the failures.
//!
//! Runs are strictly sequential so that host-wide counters sampled around a
//! run can be attributed to it. Nothing that goes wrong inside a single run
//! escapes the loop: spawn failures are failed runs, probe failures zero the
//! report, artifact I/O failures are warnings. Only cancellation and the
//! failure budget change control flow.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::artifacts::{ArtifactKind, Disposition, disposition};
use crate::core::budget::FailureBudget;
use crate::core::classifier::{classify_exit_code, is_interrupt_exit};
use crate::core::command::{TracerPrefix, invocation_argv};
use crate::core::report::{render_output_trace, render_resource_report};
use crate::core::summary::Tally;
use crate::core::types::{ResourceDelta, RunStatus, TraceFlags};
use crate::io::artifacts::ArtifactStore;
use crate::io::executor::{ExecOutcome, ExecRequest, Executor};
use crate::io::probe::{ResourceProbe, sample_or_default};

/// How long a run that died from SIGINT or SIGTERM waits for the session's
/// interrupt handler before it is classified as an ordinary failure.
const INTERRUPT_SETTLE: Duration = Duration::from_millis(250);

/// Immutable description of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Program and arguments, run verbatim on every iteration.
    pub command: Vec<String>,
    /// Number of invocations to attempt (at least one).
    pub repeat_count: u32,
    /// Stop after this many failures; `None` runs every repeat.
    pub failure_budget: Option<u32>,
    pub trace: TraceFlags,
    /// Accepted for compatibility; no packet capture is produced.
    pub net_trace: bool,
    pub artifact_dir: PathBuf,
    pub tracer: TracerPrefix,
    pub output_limit_bytes: usize,
    pub poll_interval: Duration,
}

/// Reason why `run_session` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStop {
    /// Every requested repeat ran.
    Completed,
    /// The failure budget reached zero.
    BudgetExhausted,
    /// An interrupt was received.
    Cancelled,
}

/// Summary of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub tally: Tally,
    /// Invocations that were started, including an interrupted one.
    pub runs_started: u32,
    pub stop: LoopStop,
}

/// What one classified run left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub index: u32,
    pub exit_code: i32,
    pub status: RunStatus,
    pub resources: ResourceDelta,
    /// Artifact files kept on disk for this run.
    pub retained: Vec<PathBuf>,
}

/// Run the session's command up to `repeat_count` times.
///
/// `on_run` is called once per classified run, after its artifacts have been
/// retained or discarded. An interrupted run is neither classified nor
/// reported.
pub fn run_session<E: Executor, P: ResourceProbe, F: FnMut(&RunRecord)>(
    config: &SessionConfig,
    executor: &E,
    probe: &P,
    cancel: &CancellationToken,
    mut on_run: F,
) -> LoopOutcome {
    let store = ArtifactStore::new(&config.artifact_dir);
    if config.trace != TraceFlags::default()
        && let Err(err) = store.prepare()
    {
        warn!(
            dir = %store.dir().display(),
            err = %format!("{err:#}"),
            "artifact directory unavailable"
        );
    }
    let mem_total_kib = probe.mem_total_kib().unwrap_or_else(|err| {
        warn!(err = %format!("{err:#}"), "memory size probe failed");
        0
    });
    if config.net_trace {
        debug!("net trace requested; packet capture is not produced");
    }

    let mut tally = Tally::default();
    let mut budget = FailureBudget::new(config.failure_budget);
    let mut runs_started = 0u32;
    let mut stop = LoopStop::Completed;
    let mut tracer_warned = false;

    debug!("Start the execution");
    for index in 0..config.repeat_count {
        if cancel.is_cancelled() {
            stop = LoopStop::Cancelled;
            break;
        }

        debug!("Running the {} command", index + 1);
        debug!("Running {}", config.command.join(" "));
        let call_log = config
            .trace
            .call_trace
            .then(|| store.path_for(ArtifactKind::CallTrace, index, &config.command));
        let request = ExecRequest {
            index,
            argv: invocation_argv(
                &config.command,
                call_log.as_deref().map(|path| (&config.tracer, path)),
            ),
            output_limit_bytes: config.output_limit_bytes,
            poll_interval: config.poll_interval,
        };

        runs_started += 1;
        let before = sample_or_default(probe);
        let started = Instant::now();
        let outcome = executor.exec(&request, cancel).unwrap_or_else(|err| {
            warn!(index, err = %format!("{err:#}"), "executor failed, recording run as failed");
            ExecOutcome::spawn_failure(format!("{err:#}"))
        });
        let elapsed = started.elapsed();
        let after = sample_or_default(probe);

        if !outcome.cancelled && is_interrupt_exit(outcome.exit_code) {
            settle_interrupt(cancel, config.poll_interval);
        }
        if outcome.cancelled || cancel.is_cancelled() {
            info!(index, "run interrupted before classification");
            if let Some(path) = &call_log {
                store.discard_or_warn(path);
            }
            stop = LoopStop::Cancelled;
            break;
        }

        if outcome.spawn_failed && call_log.is_some() && !tracer_warned {
            warn!(
                tracer = config.tracer.argv.first().map(String::as_str).unwrap_or_default(),
                "call tracer unavailable; traced runs fail until it is installed"
            );
            tracer_warned = true;
        }

        debug!("Execution return code: {}", outcome.exit_code);
        let status = classify_exit_code(outcome.exit_code);
        tally.record(status);

        let resources =
            ResourceDelta::between(&before, &after, elapsed, mem_total_kib, outcome.peak_rss_kib);
        let retained = dispose_artifacts(
            &store,
            config,
            index,
            status,
            &outcome,
            &resources,
            call_log.as_deref(),
        );
        on_run(&RunRecord {
            index,
            exit_code: outcome.exit_code,
            status,
            resources,
            retained,
        });
        debug!("Finishing Execution {}", index + 1);

        if status.is_failure() {
            let exhausted = budget.record_failure();
            debug!(index, remaining = ?budget.remaining(), "failure recorded");
            if exhausted {
                info!(index, failed = tally.failed, "failure budget exhausted");
                stop = LoopStop::BudgetExhausted;
                break;
            }
        }
    }
    debug!(classified = tally.total(), ?stop, "session finished");

    LoopOutcome {
        tally,
        runs_started,
        stop,
    }
}

/// Give the interrupt listener a moment to cancel `cancel`.
///
/// Returns as soon as the token is cancelled, or after [`INTERRUPT_SETTLE`].
fn settle_interrupt(cancel: &CancellationToken, poll_interval: Duration) {
    let deadline = Instant::now() + INTERRUPT_SETTLE;
    while !cancel.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(poll_interval.min(deadline - now));
    }
}

/// Retain or discard each trace artifact of a classified run.
///
/// Resource and output traces are only written when retained. The call trace
/// is written by the tracer itself, so it exists whenever the command was
/// wrapped and must be removed unless retained.
fn dispose_artifacts(
    store: &ArtifactStore,
    config: &SessionConfig,
    index: u32,
    status: RunStatus,
    outcome: &ExecOutcome,
    resources: &ResourceDelta,
    call_log: Option<&Path>,
) -> Vec<PathBuf> {
    let mut retained = Vec::new();
    for kind in ArtifactKind::ALL {
        let path = store.path_for(kind, index, &config.command);
        match disposition(kind, status, &config.trace) {
            Disposition::Retained => {
                let kept = match kind {
                    ArtifactKind::ResourceTrace => {
                        debug!("Saving sys trace log");
                        store.persist_or_warn(&path, &render_resource_report(resources))
                    }
                    ArtifactKind::CallTrace => {
                        debug!("Saving call trace log");
                        if !path.exists() {
                            warn!(path = %path.display(), "tracer produced no call trace log");
                        }
                        path.exists()
                    }
                    ArtifactKind::OutputTrace => {
                        debug!("Saving log trace");
                        store.persist_or_warn(
                            &path,
                            &render_output_trace(&outcome.stdout, &outcome.stderr),
                        )
                    }
                };
                if kept {
                    retained.push(path);
                }
            }
            Disposition::Discarded => {
                if kind == ArtifactKind::CallTrace
                    && let Some(call_log) = call_log
                {
                    store.discard_or_warn(call_log);
                }
            }
        }
    }
    retained
}
