//! Resource probes sampled around each invocation.
//!
//! Network counters are host-wide (`/proc/net/dev`), which is why runs must
//! never overlap. Process counters come from `getrusage(RUSAGE_CHILDREN)`,
//! which covers every child this process has reaped so far; the delta across
//! one run isolates that run's child (and its tracer, when call tracing).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use nix::sys::resource::{UsageWho, getrusage};
use nix::sys::time::TimeValLike;
use tracing::warn;

use crate::core::procfs::{parse_mem_total_kib, parse_net_dev};
use crate::core::report::ResourceSample;
use crate::core::types::{NetCounters, ProcessUsage};

/// Source of resource counters.
pub trait ResourceProbe {
    /// Host-wide packet counters.
    fn sample_host(&self) -> Result<NetCounters>;
    /// Usage accumulated by reaped children.
    fn sample_process(&self) -> Result<ProcessUsage>;
    /// Physical memory in KiB, used to turn peak RSS into a percentage.
    fn mem_total_kib(&self) -> Result<u64>;
}

/// Take both samples, degrading each failed half to zeros.
///
/// Probe failures never abort a run; they only make the report less useful.
pub fn sample_or_default<P: ResourceProbe + ?Sized>(probe: &P) -> ResourceSample {
    let net = probe.sample_host().unwrap_or_else(|err| {
        warn!(err = %format!("{err:#}"), "host network probe failed");
        NetCounters::default()
    });
    let usage = probe.sample_process().unwrap_or_else(|err| {
        warn!(err = %format!("{err:#}"), "process usage probe failed");
        ProcessUsage::default()
    });
    ResourceSample { net, usage }
}

/// Probe backed by `/proc` and `getrusage`.
pub struct SystemProbe {
    proc_root: PathBuf,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    fn read_proc(&self, relative: &str) -> Result<String> {
        let path = self.proc_root.join(relative);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SystemProbe {
    fn sample_host(&self) -> Result<NetCounters> {
        let contents = self.read_proc("net/dev")?;
        parse_net_dev(&contents).context("parse net/dev")
    }

    fn sample_process(&self) -> Result<ProcessUsage> {
        let usage = getrusage(UsageWho::RUSAGE_CHILDREN).context("getrusage children")?;
        let cpu_micros =
            usage.user_time().num_microseconds() + usage.system_time().num_microseconds();
        Ok(ProcessUsage {
            cpu_time_micros: u64::try_from(cpu_micros).unwrap_or(0),
            max_rss_kib: u64::try_from(usage.max_rss()).unwrap_or(0),
            block_reads: u64::try_from(usage.block_reads()).unwrap_or(0),
            block_writes: u64::try_from(usage.block_writes()).unwrap_or(0),
        })
    }

    fn mem_total_kib(&self) -> Result<u64> {
        let contents = self.read_proc("meminfo")?;
        parse_mem_total_kib(&contents)
    }
}
