//! Counter-to-rate conversion.
//!
//! Counters are monotonic but may reset (reboot, interface reset). Every
//! conversion here clamps a backwards step to zero instead of producing a
//! negative or infinite rate.

use crate::types::NetTotals;

/// Summed CPU tick counters across all cores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub idle: u64,
    pub total: u64,
}

/// Turns successive tick totals into a usage percentage.
///
/// The first observation only records a baseline and reports 0.
#[derive(Debug, Default)]
pub struct CpuRateEstimator {
    prev: Option<CpuTicks>,
}

impl CpuRateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, now: CpuTicks) -> f32 {
        let usage = match self.prev {
            Some(prev) => cpu_usage_between(prev, now),
            None => 0.0,
        };
        self.prev = Some(now);
        usage
    }
}

/// `round(100 * (1 - idle_delta / total_delta))`, clamped to 0..=100.
/// A zero or negative total delta yields 0.
pub fn cpu_usage_between(prev: CpuTicks, now: CpuTicks) -> f32 {
    let total_delta = now.total as i128 - prev.total as i128;
    if total_delta <= 0 {
        return 0.0;
    }
    let idle_delta = now.idle as i128 - prev.idle as i128;
    let busy = 1.0 - idle_delta as f64 / total_delta as f64;
    (100.0 * busy).round().clamp(0.0, 100.0) as f32
}

/// Bytes per second between two counter readings, rounded.
/// No elapsed time or a counter decrease yields 0.
pub fn byte_rate(prev: u64, now: u64, elapsed_secs: f64) -> u64 {
    if elapsed_secs.is_nan() || elapsed_secs <= 0.0 || now < prev {
        return 0;
    }
    ((now - prev) as f64 / elapsed_secs).round() as u64
}

/// Per-direction network throughput in bytes/sec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct NetSpeed {
    pub rx: u64,
    pub tx: u64,
}

impl NetSpeed {
    pub fn between(prev: NetTotals, prev_ms: i64, now: NetTotals, now_ms: i64) -> Self {
        let elapsed = (now_ms - prev_ms) as f64 / 1000.0;
        Self {
            rx: byte_rate(prev.rx, now.rx, elapsed),
            tx: byte_rate(prev.tx, now.tx, elapsed),
        }
    }
}
