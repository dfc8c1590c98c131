//! Report ingestion and the collector's aggregated view.
//!
//! One [`Collector`] owns the latest accepted report and both history rings
//! behind a single lock, so the network-speed delta (read previous, write new)
//! and the ring updates happen as one step per report.

use serde::Serialize;
use serde_json::Value;
use sysinfo::System;
use tokio::sync::Mutex;
use tracing::debug;
use vpnstat_probe::rate::NetSpeed;
use vpnstat_probe::{activity_score, normalize_activity, ActivitySnapshot, NativeSource, Sample};

use crate::history::HistoryRing;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Invalid API key")]
    Unauthorized,
    #[error("Missing required fields")]
    MissingFields,
    #[error("Malformed report: {0}")]
    Malformed(String),
}

/// Where the current view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Local,
    Remote,
}

#[derive(Debug, Clone)]
struct Reported {
    sample: Sample,
    network_speed: NetSpeed,
    received_at_ms: i64,
}

#[derive(Debug, Default)]
struct Aggregate {
    latest: Option<Reported>,
    cpu_history: HistoryRing<f32>,
    activity_history: HistoryRing<u8>,
}

impl Aggregate {
    fn apply(&mut self, sample: Sample, now_ms: i64) {
        // Histories stay ordered even if the wall clock steps back.
        let now_ms = match &self.latest {
            Some(prev) => now_ms.max(prev.received_at_ms),
            None => now_ms,
        };
        let network_speed = match &self.latest {
            Some(prev) => NetSpeed::between(
                prev.sample.network,
                prev.received_at_ms,
                sample.network,
                now_ms,
            ),
            None => NetSpeed::default(),
        };
        self.cpu_history.push(sample.cpu.usage, now_ms);
        if let Some(activity) = &sample.activity {
            self.activity_history.push(activity_score(activity), now_ms);
        }
        self.latest = Some(Reported {
            sample,
            network_speed,
            received_at_ms: now_ms,
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuHistoryView {
    pub cpu: Vec<f32>,
    pub timestamps: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityHistoryView {
    pub scores: Vec<u8>,
    pub timestamps: Vec<i64>,
}

/// What `GET /api/stats` returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    #[serde(flatten)]
    pub sample: Sample,
    pub network_speed: NetSpeed,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<i64>,
    pub source: Provenance,
    pub history: CpuHistoryView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_history: Option<ActivityHistoryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEntry {
    pub id: String,
    pub name: String,
    pub region: String,
    pub status: String,
    pub users: u64,
}

/// Validate a raw report body (after authentication) into a sample with a
/// normalized activity snapshot.
pub fn parse_report(body: &Value) -> Result<Sample, IngestError> {
    let present = |k: &str| body.get(k).is_some_and(|v| !v.is_null());
    if !(present("server") && present("cpu") && present("memory")) {
        return Err(IngestError::MissingFields);
    }
    let activity = body
        .get("activity")
        .filter(|v| !v.is_null())
        .map(normalize_activity);

    let mut fields = body.as_object().cloned().unwrap_or_default();
    fields.remove("activity");
    fields.remove("apiKey");
    let mut sample: Sample = serde_json::from_value(Value::Object(fields))
        .map_err(|e| IngestError::Malformed(e.to_string()))?;
    sample.activity = activity;
    Ok(sample)
}

pub struct Collector {
    api_key: String,
    aggregate: Mutex<Aggregate>,
    local: Mutex<NativeSource>,
}

impl Collector {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            aggregate: Mutex::new(Aggregate::default()),
            local: Mutex::new(NativeSource::new()),
        }
    }

    /// Accept one report. The credential comes from the header, else from the
    /// body's `apiKey`, and is checked before anything else. `clock` is read
    /// only once the aggregate lock is held, so arrival order and stamp order agree.
    pub async fn accept(
        &self,
        body: &Value,
        header_key: Option<&str>,
        clock: impl FnOnce() -> i64 + Send,
    ) -> Result<(), IngestError> {
        let supplied = header_key.or_else(|| body.get("apiKey").and_then(Value::as_str));
        if supplied != Some(self.api_key.as_str()) {
            return Err(IngestError::Unauthorized);
        }
        let sample = parse_report(body)?;
        debug!(
            "report from {} (cpu {}%, mem {}%)",
            sample.host.name, sample.cpu.usage, sample.memory.percent
        );
        let mut aggregate = self.aggregate.lock().await;
        let now_ms = clock();
        aggregate.apply(sample, now_ms);
        Ok(())
    }

    /// Current view: the latest report with histories, or a local sample when
    /// nothing has been reported yet.
    pub async fn stats(&self) -> StatsView {
        {
            let agg = self.aggregate.lock().await;
            if let Some(latest) = &agg.latest {
                let mut sample = latest.sample.clone();
                sample.activity.get_or_insert_with(ActivitySnapshot::default);
                return StatsView {
                    sample,
                    network_speed: latest.network_speed,
                    received_at: Some(latest.received_at_ms),
                    source: Provenance::Remote,
                    history: CpuHistoryView {
                        cpu: agg.cpu_history.values(),
                        timestamps: agg.cpu_history.timestamps(),
                    },
                    activity_history: (!agg.activity_history.is_empty()).then(|| {
                        ActivityHistoryView {
                            scores: agg.activity_history.values(),
                            timestamps: agg.activity_history.timestamps(),
                        }
                    }),
                };
            }
        }
        let sample = self.local.lock().await.sample_now();
        StatsView {
            sample,
            network_speed: NetSpeed::default(),
            received_at: None,
            source: Provenance::Local,
            history: CpuHistoryView::default(),
            activity_history: None,
        }
    }

    /// The single-entry server roster.
    pub async fn roster(&self) -> Vec<ServerEntry> {
        let agg = self.aggregate.lock().await;
        let entry = match &agg.latest {
            Some(latest) => ServerEntry {
                id: "1".into(),
                name: latest.sample.host.name.clone(),
                region: "Remote".into(),
                status: latest.sample.host.status.clone(),
                users: latest.sample.connections,
            },
            None => ServerEntry {
                id: "1".into(),
                name: System::host_name().unwrap_or_else(|| "unknown".into()),
                region: "Local".into(),
                status: "online".into(),
                users: 0,
            },
        };
        vec![entry]
    }
}
