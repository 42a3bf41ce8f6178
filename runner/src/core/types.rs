//! Shared deterministic types for the execution loop.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

/// Classification of one finished invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The command exited with code `0`.
    Succeeded,
    /// The command exited non-zero, was killed by a signal, or could not be spawned.
    Failed,
}

impl RunStatus {
    pub fn is_failure(self) -> bool {
        self == RunStatus::Failed
    }
}

/// Which trace artifacts a session collects for failed runs.
///
/// The three flags are independent; none implies or orders another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceFlags {
    /// `--call-trace`: syscall log from the tracer wrapper.
    pub call_trace: bool,
    /// `--sys-trace`: resource usage report.
    pub resource_trace: bool,
    /// `--log-trace`: captured stdout/stderr dump.
    pub output_trace: bool,
}

/// Host-wide network packet counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub packets_recv: u64,
    pub packets_sent: u64,
}

/// Resource usage accumulated by reaped children of this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessUsage {
    /// User plus system CPU time, in microseconds.
    pub cpu_time_micros: u64,
    /// Largest peak resident set size of any reaped child so far, in KiB.
    ///
    /// A session-wide high-water mark: it only says something about one run
    /// when it rises across that run.
    pub max_rss_kib: u64,
    /// Block input operations.
    pub block_reads: u64,
    /// Block output operations.
    pub block_writes: u64,
}

/// Disk I/O operations attributed to one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskIoCounters {
    pub read_blocks: u64,
    pub write_blocks: u64,
}

/// Difference between resource samples taken around one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceDelta {
    pub cpu_percent: f64,
    /// Peak RSS of the run as a share of physical memory; `None` when neither
    /// the running process nor the reaped-children high-water mark revealed it.
    pub memory_percent: Option<f64>,
    pub disk_io: DiskIoCounters,
    pub net_packets_recv: u64,
    pub net_packets_sent: u64,
}
