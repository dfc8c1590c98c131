//! Host telemetry sampling shared by the vpnstat agent and collector.
//!
//! The agent turns a [`Sample`] into a report; the collector falls back to a
//! locally taken sample when no agent has reported yet. Both sides derive the
//! activity score through [`activity::activity_score`].

pub mod activity;
pub mod rate;
pub mod source;
pub mod types;

pub use activity::{activity_score, normalize_activity};
pub use source::{ConfiguredSource, ExporterSource, Fallback, NativeSource, SampleError, SampleSource};
pub use types::{ActivitySnapshot, CpuInfo, HostInfo, MemoryInfo, NetTotals, Sample};
