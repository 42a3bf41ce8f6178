//! Parsers for the `/proc` text files read by the resource probe.

use anyhow::{Context, Result, anyhow, bail};

use crate::core::types::NetCounters;

/// Sum received and sent packets over every interface in `/proc/net/dev`.
///
/// The first two lines are headers. Each following line is
/// `iface: rx_bytes rx_packets ... tx_bytes tx_packets ...` with eight receive
/// columns before the transmit columns.
pub fn parse_net_dev(contents: &str) -> Result<NetCounters> {
    let mut counters = NetCounters::default();
    for (lineno, line) in contents.lines().enumerate().skip(2) {
        let Some((iface, stats)) = line.split_once(':') else {
            continue;
        };
        let columns: Vec<&str> = stats.split_whitespace().collect();
        if columns.len() < 10 {
            bail!(
                "line {}: interface {} has {} columns, expected at least 10",
                lineno + 1,
                iface.trim(),
                columns.len()
            );
        }
        let recv: u64 = columns[1]
            .parse()
            .with_context(|| format!("parse rx packets for {}", iface.trim()))?;
        let sent: u64 = columns[9]
            .parse()
            .with_context(|| format!("parse tx packets for {}", iface.trim()))?;
        counters.packets_recv = counters.packets_recv.saturating_add(recv);
        counters.packets_sent = counters.packets_sent.saturating_add(sent);
    }
    Ok(counters)
}

/// Extract `MemTotal` (KiB) from `/proc/meminfo`.
pub fn parse_mem_total_kib(contents: &str) -> Result<u64> {
    parse_kib_field(contents, "MemTotal")
}

/// Extract the peak resident set size `VmHWM` (KiB) from `/proc/<pid>/status`.
pub fn parse_vm_hwm_kib(contents: &str) -> Result<u64> {
    parse_kib_field(contents, "VmHWM")
}

fn parse_kib_field(contents: &str, field: &str) -> Result<u64> {
    let line = contents
        .lines()
        .find(|line| line.split_once(':').is_some_and(|(key, _)| key == field))
        .ok_or_else(|| anyhow!("{field} missing"))?;
    let value = line[field.len() + 1..]
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("{field} has no value"))?;
    value.parse().with_context(|| format!("parse {field}"))
}
