//! Report payload shared by the agent and the collector. Field names here
//! are the JSON keys on the wire.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub name: String,
    #[serde(default = "online")]
    pub status: String,
    #[serde(rename = "uptime", default)]
    pub uptime_seconds: u64,
}

fn online() -> String {
    "online".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// 0..=100, already rounded by the producer
    pub usage: f32,
    #[serde(default)]
    pub cores: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub used: u64,
    pub total: u64,
    #[serde(default)]
    pub percent: f32,
}

impl MemoryInfo {
    /// Builds a memory reading from totals, keeping `used <= total`.
    pub fn from_totals(total: u64, available: u64) -> Self {
        let used = total.saturating_sub(available);
        let percent = if total == 0 {
            0.0
        } else {
            ((used as f64 / total as f64) * 100.0).round() as f32
        };
        Self {
            used,
            total,
            percent,
        }
    }
}

/// Cumulative interface byte counters (client diffs to get rates).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetTotals {
    #[serde(default)]
    pub rx: u64,
    #[serde(default)]
    pub tx: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub keys_total: u64,
    pub clicks_total: u64,
    pub keys_per_minute: u64,
    pub clicks_per_minute: u64,
    pub keys_by_letter: BTreeMap<String, u64>,
}

/// One point-in-time snapshot of a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "server")]
    pub host: HostInfo,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    #[serde(default)]
    pub network: NetTotals,
    #[serde(default)]
    pub connections: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySnapshot>,
}
