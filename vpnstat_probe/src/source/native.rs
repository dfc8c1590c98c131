//! Native sampling: sysinfo for memory/host data, procfs tables for CPU ticks,
//! interface counters and TCP sockets on Linux.

#[cfg(target_os = "linux")]
use std::fs;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::{SampleError, SampleSource};
use crate::rate::{CpuRateEstimator, CpuTicks};
use crate::types::{CpuInfo, HostInfo, MemoryInfo, NetTotals, Sample};

pub struct NativeSource {
    sys: System,
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    cpu_rate: CpuRateEstimator,
}

impl Default for NativeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeSource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram());
        Self {
            sys: System::new_with_specifics(refresh_kind),
            cpu_rate: CpuRateEstimator::new(),
        }
    }

    /// Synchronous sample; failures degrade to zero-valued fields.
    pub fn sample_now(&mut self) -> Sample {
        self.sys.refresh_memory();
        let usage = self.cpu_usage();
        let memory = MemoryInfo::from_totals(self.sys.total_memory(), self.sys.available_memory());
        Sample {
            host: HostInfo {
                name: System::host_name().unwrap_or_else(|| "unknown".into()),
                status: "online".into(),
                uptime_seconds: System::uptime(),
            },
            cpu: CpuInfo {
                usage,
                cores: self.sys.cpus().len() as u32,
            },
            memory,
            network: read_net_totals(),
            connections: count_connections(),
            activity: None,
        }
    }

    #[cfg(target_os = "linux")]
    fn cpu_usage(&mut self) -> f32 {
        match fs::read_to_string("/proc/stat").ok().and_then(|s| parse_proc_stat(&s)) {
            Some(ticks) => self.cpu_rate.observe(ticks),
            None => 0.0,
        }
    }

    // No tick table here; sysinfo keeps its own previous-refresh deltas,
    // so the first reading is 0 as well.
    #[cfg(not(target_os = "linux"))]
    fn cpu_usage(&mut self) -> f32 {
        self.sys.refresh_cpu_usage();
        self.sys.global_cpu_usage().round().clamp(0.0, 100.0)
    }
}

impl SampleSource for NativeSource {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        Ok(self.sample_now())
    }
}

/// Sum idle and total ticks over the per-core lines (`cpu0`, `cpu1`, ...) of
/// `/proc/stat`. Total is the first eight columns, idle is the fourth.
pub fn parse_proc_stat(text: &str) -> Option<CpuTicks> {
    let mut ticks = CpuTicks::default();
    let mut cores = 0usize;
    for line in text.lines() {
        let mut it = line.split_whitespace();
        let Some(label) = it.next() else { continue };
        let is_core = label
            .strip_prefix("cpu")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if !is_core {
            continue;
        }
        for (i, tok) in it.take(8).enumerate() {
            let v = tok.parse::<u64>().unwrap_or(0);
            ticks.total = ticks.total.saturating_add(v);
            if i == 3 {
                ticks.idle = ticks.idle.saturating_add(v);
            }
        }
        cores += 1;
    }
    (cores > 0).then_some(ticks)
}

/// Sum receive/transmit bytes over every non-loopback interface of
/// `/proc/net/dev`.
pub fn parse_proc_net_dev(text: &str) -> NetTotals {
    let mut totals = NetTotals::default();
    // two header lines
    for line in text.lines().skip(2) {
        let Some((iface, counters)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let fields: Vec<&str> = counters.split_whitespace().collect();
        let field = |i: usize| fields.get(i).and_then(|t| t.parse::<u64>().ok()).unwrap_or(0);
        totals.rx = totals.rx.saturating_add(field(0));
        totals.tx = totals.tx.saturating_add(field(8));
    }
    totals
}

/// Count sockets in the ESTABLISHED state (`st == 01`) of a `/proc/net/tcp*` table.
pub fn parse_tcp_established(text: &str) -> u64 {
    text.lines()
        .skip(1)
        .filter(|line| line.split_whitespace().nth(3) == Some("01"))
        .count() as u64
}

#[cfg(target_os = "linux")]
fn read_net_totals() -> NetTotals {
    fs::read_to_string("/proc/net/dev")
        .map(|s| parse_proc_net_dev(&s))
        .unwrap_or_default()
}

#[cfg(not(target_os = "linux"))]
fn read_net_totals() -> NetTotals {
    NetTotals::default()
}

#[cfg(target_os = "linux")]
fn count_connections() -> u64 {
    ["/proc/net/tcp", "/proc/net/tcp6"]
        .iter()
        .filter_map(|p| fs::read_to_string(p).ok())
        .map(|s| parse_tcp_established(&s))
        .sum()
}

#[cfg(not(target_os = "linux"))]
fn count_connections() -> u64 {
    0
}
