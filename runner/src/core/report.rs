//! Rendering of trace artifact contents and resource deltas.

use std::time::Duration;

use crate::core::types::{DiskIoCounters, NetCounters, ProcessUsage, ResourceDelta};

/// Samples taken on one side of an invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceSample {
    pub net: NetCounters,
    pub usage: ProcessUsage,
}

impl ResourceDelta {
    /// Compute the delta between samples bracketing one run.
    ///
    /// `mem_total_kib` is the host's physical memory; `0` means unknown.
    /// `observed_peak_rss_kib` is the peak RSS sampled from the running
    /// process, if any. The reaped-children high-water mark only counts when
    /// it rose during this run, since otherwise it belongs to an earlier run.
    /// Counters that went backwards (probe failed on one side) saturate to zero.
    pub fn between(
        before: &ResourceSample,
        after: &ResourceSample,
        elapsed: Duration,
        mem_total_kib: u64,
        observed_peak_rss_kib: Option<u64>,
    ) -> Self {
        let cpu_micros = after
            .usage
            .cpu_time_micros
            .saturating_sub(before.usage.cpu_time_micros);
        let elapsed_micros = elapsed.as_micros();
        let cpu_percent = if elapsed_micros == 0 {
            0.0
        } else {
            cpu_micros as f64 / elapsed_micros as f64 * 100.0
        };
        let reaped_peak_kib = (after.usage.max_rss_kib > before.usage.max_rss_kib)
            .then_some(after.usage.max_rss_kib);
        let memory_percent = reaped_peak_kib
            .max(observed_peak_rss_kib)
            .filter(|_| mem_total_kib > 0)
            .map(|peak_kib| peak_kib as f64 / mem_total_kib as f64 * 100.0);

        Self {
            cpu_percent,
            memory_percent,
            disk_io: DiskIoCounters {
                read_blocks: after
                    .usage
                    .block_reads
                    .saturating_sub(before.usage.block_reads),
                write_blocks: after
                    .usage
                    .block_writes
                    .saturating_sub(before.usage.block_writes),
            },
            net_packets_recv: after
                .net
                .packets_recv
                .saturating_sub(before.net.packets_recv),
            net_packets_sent: after
                .net
                .packets_sent
                .saturating_sub(before.net.packets_sent),
        }
    }
}

/// Render the resource trace report, one metric per line.
///
/// An unmeasured memory percentage is written as `unknown`.
pub fn render_resource_report(delta: &ResourceDelta) -> String {
    let memory = match delta.memory_percent {
        Some(percent) => format!("{percent:.2}%"),
        None => "unknown".to_string(),
    };
    format!(
        "disk_io: read_blocks={} write_blocks={}\n\
         memory percentage: {}\n\
         cpu percentage: {:.2}%\n\
         Packets received: {}\n\
         Packets sent: {}\n",
        delta.disk_io.read_blocks,
        delta.disk_io.write_blocks,
        memory,
        delta.cpu_percent,
        delta.net_packets_recv,
        delta.net_packets_sent,
    )
}

/// Render the output trace: stdout, a separating newline, then stderr.
pub fn render_output_trace(stdout: &str, stderr: &str) -> String {
    let mut buf = String::with_capacity(stdout.len() + stderr.len() + 1);
    buf.push_str(stdout);
    buf.push('\n');
    buf.push_str(stderr);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(recv: u64, sent: u64, cpu: u64, rss: u64, reads: u64, writes: u64) -> ResourceSample {
        ResourceSample {
            net: NetCounters {
                packets_recv: recv,
                packets_sent: sent,
            },
            usage: ProcessUsage {
                cpu_time_micros: cpu,
                max_rss_kib: rss,
                block_reads: reads,
                block_writes: writes,
            },
        }
    }

    #[test]
    fn delta_subtracts_before_from_after() {
        let before = sample(100, 50, 1_000, 0, 10, 20);
        let after = sample(130, 55, 251_000, 2_048, 14, 28);
        let delta =
            ResourceDelta::between(&before, &after, Duration::from_millis(500), 8_192, None);

        assert_eq!(delta.net_packets_recv, 30);
        assert_eq!(delta.net_packets_sent, 5);
        assert_eq!(delta.disk_io.read_blocks, 4);
        assert_eq!(delta.disk_io.write_blocks, 8);
        assert!((delta.cpu_percent - 50.0).abs() < 1e-9);
        assert_eq!(delta.memory_percent, Some(25.0));
    }

    #[test]
    fn delta_degrades_to_zero_on_missing_samples() {
        let before = sample(100, 50, 1_000, 0, 10, 20);
        let after = ResourceSample::default();
        let delta = ResourceDelta::between(&before, &after, Duration::ZERO, 0, None);

        assert_eq!(delta, ResourceDelta::default());
    }

    #[test]
    fn earlier_high_water_mark_is_not_attributed_to_this_run() {
        let before = sample(0, 0, 0, 409_600, 0, 0);
        let after = sample(0, 0, 0, 409_600, 0, 0);
        let delta =
            ResourceDelta::between(&before, &after, Duration::from_millis(5), 8_192_000, None);

        assert_eq!(delta.memory_percent, None);
    }

    #[test]
    fn observed_peak_is_used_when_high_water_mark_is_stale() {
        let before = sample(0, 0, 0, 409_600, 0, 0);
        let after = sample(0, 0, 0, 409_600, 0, 0);
        let delta = ResourceDelta::between(
            &before,
            &after,
            Duration::from_millis(5),
            8_192_000,
            Some(81_920),
        );

        let percent = delta.memory_percent.expect("observed peak");
        assert!((percent - 1.0).abs() < 1e-9);
    }

    #[test]
    fn larger_of_observed_and_risen_peak_wins() {
        let before = sample(0, 0, 0, 1_000, 0, 0);
        let after = sample(0, 0, 0, 4_096, 0, 0);
        let delta =
            ResourceDelta::between(&before, &after, Duration::from_millis(5), 8_192, Some(2_048));

        assert_eq!(delta.memory_percent, Some(50.0));
    }

    #[test]
    fn peak_without_host_memory_is_unknown() {
        let delta = ResourceDelta::between(
            &ResourceSample::default(),
            &ResourceSample::default(),
            Duration::from_millis(5),
            0,
            Some(2_048),
        );

        assert_eq!(delta.memory_percent, None);
    }

    #[test]
    fn resource_report_lists_each_metric_once() {
        let delta = ResourceDelta {
            cpu_percent: 12.5,
            memory_percent: Some(0.25),
            disk_io: DiskIoCounters {
                read_blocks: 3,
                write_blocks: 4,
            },
            net_packets_recv: 7,
            net_packets_sent: 2,
        };
        let report = render_resource_report(&delta);

        assert_eq!(
            report,
            "disk_io: read_blocks=3 write_blocks=4\n\
             memory percentage: 0.25%\n\
             cpu percentage: 12.50%\n\
             Packets received: 7\n\
             Packets sent: 2\n"
        );
        assert_eq!(report.matches("Packets received").count(), 1);
    }

    #[test]
    fn resource_report_marks_unmeasured_memory() {
        let report = render_resource_report(&ResourceDelta::default());
        assert!(report.contains("memory percentage: unknown\n"));
    }

    #[test]
    fn output_trace_joins_streams_with_newline() {
        assert_eq!(render_output_trace("out", "err"), "out\nerr");
        assert_eq!(render_output_trace("", ""), "\n");
    }
}
