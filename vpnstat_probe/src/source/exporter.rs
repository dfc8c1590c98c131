//! Exporter-text sampling: scrape a node-exporter style `/metrics` endpoint
//! and fold the series into a [`Sample`].

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use sysinfo::System;
use url::Url;

use super::{SampleError, SampleSource};
use crate::types::{CpuInfo, HostInfo, MemoryInfo, NetTotals, Sample};

/// Flat `series -> value` mapping, where a series is the metric name with its
/// raw label block (`node_cpu_seconds_total{cpu="0",mode="idle"}`).
#[derive(Debug, Default, Clone)]
pub struct ExporterMetrics {
    series: HashMap<String, f64>,
}

impl ExporterMetrics {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Value of an unlabelled series, or the first series of that name.
    pub fn get(&self, name: &str) -> Option<f64> {
        if let Some(v) = self.series.get(name) {
            return Some(*v);
        }
        self.matching(name).map(|(_, v)| v).next()
    }

    /// All series of `name` with their parsed labels.
    pub fn matching<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (HashMap<String, String>, f64)> + 'a {
        self.series.iter().filter_map(move |(series, v)| {
            let (metric, labels) = split_series(series);
            (metric == name).then(|| (parse_labels(labels), *v))
        })
    }

    fn sum_where(&self, name: &str, keep: impl Fn(&HashMap<String, String>) -> bool) -> f64 {
        self.matching(name)
            .filter(|(labels, _)| keep(labels))
            .map(|(_, v)| v)
            .sum()
    }
}

fn split_series(series: &str) -> (&str, &str) {
    match series.find('{') {
        Some(i) => (&series[..i], series[i + 1..].trim_end_matches('}')),
        None => (series, ""),
    }
}

fn parse_labels(block: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    let mut rest = block;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim().trim_start_matches(',').trim().to_string();
        let after = rest[eq + 1..].trim_start();
        let Some(body) = after.strip_prefix('"') else {
            break;
        };
        let mut value = String::new();
        let mut escaped = false;
        let mut end = body.len();
        for (i, c) in body.char_indices() {
            match c {
                _ if escaped => {
                    value.push(c);
                    escaped = false;
                }
                '\\' => escaped = true,
                '"' => {
                    end = i + 1;
                    break;
                }
                _ => value.push(c),
            }
        }
        labels.insert(key, value);
        rest = &body[end.min(body.len())..];
    }
    labels
}

/// Parse the line-delimited `series value [timestamp]` text format.
/// Comments, blank lines and non-finite values are skipped.
pub fn parse_exporter_text(text: &str) -> ExporterMetrics {
    let mut series = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, rest) = match line.find('{').and_then(|_| line.rfind('}')) {
            Some(close) => (&line[..=close], &line[close + 1..]),
            None => match line.split_once(char::is_whitespace) {
                Some((n, r)) => (n, r),
                None => continue,
            },
        };
        let Some(value) = rest.split_whitespace().next().and_then(|v| v.parse::<f64>().ok()) else {
            continue;
        };
        if value.is_finite() {
            series.insert(name.to_string(), value);
        }
    }
    ExporterMetrics { series }
}

/// Fold exporter series into a sample. Host name and uptime fall back to the
/// local machine when the exporter does not publish them.
pub fn sample_from_exporter(m: &ExporterMetrics) -> Result<Sample, SampleError> {
    const CPU: &str = "node_cpu_seconds_total";
    if m.is_empty() {
        return Err(SampleError::Parse("exporter returned no series".into()));
    }
    let all = m.sum_where(CPU, |_| true);
    if all <= 0.0 {
        return Err(SampleError::Parse(format!("no {CPU} series")));
    }
    let idle = m.sum_where(CPU, |l| l.get("mode").map(String::as_str) == Some("idle"));
    let usage = (100.0 - 100.0 * idle / all).round().clamp(0.0, 100.0) as f32;
    let cores = m
        .matching(CPU)
        .filter_map(|(mut l, _)| l.remove("cpu"))
        .collect::<BTreeSet<_>>()
        .len() as u32;

    let total = m.get("node_memory_MemTotal_bytes").unwrap_or(0.0).max(0.0) as u64;
    let available = m.get("node_memory_MemAvailable_bytes").unwrap_or(0.0).max(0.0) as u64;

    let not_loopback = |l: &HashMap<String, String>| l.get("device").map(String::as_str) != Some("lo");
    let network = NetTotals {
        rx: m.sum_where("node_network_receive_bytes_total", not_loopback) as u64,
        tx: m.sum_where("node_network_transmit_bytes_total", not_loopback) as u64,
    };

    let name = m
        .matching("node_uname_info")
        .find_map(|(mut l, _)| l.remove("nodename"))
        .or_else(System::host_name)
        .unwrap_or_else(|| "unknown".into());
    let uptime_seconds = match (m.get("node_time_seconds"), m.get("node_boot_time_seconds")) {
        (Some(now), Some(boot)) if now >= boot => (now - boot) as u64,
        _ => System::uptime(),
    };

    Ok(Sample {
        host: HostInfo {
            name,
            status: "online".into(),
            uptime_seconds,
        },
        cpu: CpuInfo { usage, cores },
        memory: MemoryInfo::from_totals(total, available),
        network,
        connections: m.get("node_netstat_Tcp_CurrEstab").unwrap_or(0.0).max(0.0) as u64,
        activity: None,
    })
}

pub struct ExporterSource {
    client: reqwest::Client,
    url: Url,
}

impl ExporterSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, SampleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

}

impl SampleSource for ExporterSource {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        let resp = self.client.get(self.url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SampleError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        sample_from_exporter(&parse_exporter_text(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_labels, split_series};

    #[test]
    fn labels_with_commas_and_escapes() {
        let l = parse_labels(r#"device="eth0",note="a,b \"q\"""#);
        assert_eq!(l["device"], "eth0");
        assert_eq!(l["note"], r#"a,b "q""#);
    }

    #[test]
    fn series_without_labels() {
        assert_eq!(split_series("up"), ("up", ""));
        assert_eq!(split_series(r#"x{a="1"}"#), ("x", r#"a="1""#));
    }
}
