//! Exporter-text parsing and the fallback composition.
use std::time::Duration;

use vpnstat_probe::source::{parse_exporter_text, sample_from_exporter};
use vpnstat_probe::{ExporterSource, Fallback, Sample, SampleError, SampleSource};

const METRICS: &str = r#"
# HELP node_cpu_seconds_total Seconds the CPUs spent in each mode.
# TYPE node_cpu_seconds_total counter
node_cpu_seconds_total{cpu="0",mode="idle"} 300
node_cpu_seconds_total{cpu="0",mode="system"} 50
node_cpu_seconds_total{cpu="0",mode="user"} 150
node_cpu_seconds_total{cpu="1",mode="idle"} 450
node_cpu_seconds_total{cpu="1",mode="system"} 20
node_cpu_seconds_total{cpu="1",mode="user"} 30
node_memory_MemTotal_bytes 8.0e+09
node_memory_MemAvailable_bytes 2e9
node_network_receive_bytes_total{device="eth0"} 1000
node_network_receive_bytes_total{device="lo"} 99999
node_network_receive_bytes_total{device="wg0"} 24
node_network_transmit_bytes_total{device="eth0"} 4000 1700000000000
node_network_transmit_bytes_total{device="lo"} 99999
node_netstat_Tcp_CurrEstab 7
node_uname_info{domainname="(none)",machine="x86_64",nodename="vpn-1",release="6.1.0"} 1
node_boot_time_seconds 1.7e9
node_time_seconds 1700000360.5
node_scrape_collector_success{collector="hwmon"} NaN
"#;

#[test]
fn parses_flat_series_mapping() {
    let m = parse_exporter_text(METRICS);
    assert_eq!(m.len(), 17);
    assert_eq!(m.get("node_memory_MemTotal_bytes"), Some(8.0e9));
    assert_eq!(m.get("node_netstat_Tcp_CurrEstab"), Some(7.0));
    assert_eq!(m.get("node_scrape_collector_success"), None);
}

#[test]
fn folds_series_into_sample() {
    let s = sample_from_exporter(&parse_exporter_text(METRICS)).expect("cpu series present");
    // idle 750 of 1000 seconds
    assert_eq!(s.cpu.usage, 25.0);
    assert_eq!(s.cpu.cores, 2);
    assert_eq!(s.memory.total, 8_000_000_000);
    assert_eq!(s.memory.used, 6_000_000_000);
    assert_eq!(s.memory.percent, 75.0);
    assert_eq!(s.network.rx, 1024);
    assert_eq!(s.network.tx, 4000);
    assert_eq!(s.connections, 7);
    assert_eq!(s.host.name, "vpn-1");
    assert_eq!(s.host.uptime_seconds, 360);
}

#[test]
fn missing_cpu_series_is_an_error() {
    let err = sample_from_exporter(&parse_exporter_text("node_load1 0.5\n")).unwrap_err();
    assert!(matches!(err, SampleError::Parse(_)));
}

#[test]
fn comment_only_body_has_no_series() {
    let m = parse_exporter_text("# HELP node_load1 1m load average.\n# TYPE node_load1 gauge\n\n");
    assert!(m.is_empty());
    let err = sample_from_exporter(&m).unwrap_err();
    assert!(matches!(err, SampleError::Parse(ref msg) if msg.contains("no series")));
}

struct Failing;

impl SampleSource for Failing {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        Err(SampleError::Status(503))
    }
}

struct Fixed(Sample);

impl SampleSource for Fixed {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        Ok(self.0.clone())
    }
}

fn fixed_sample(name: &str) -> Sample {
    sample_from_exporter(&parse_exporter_text(&METRICS.replace("vpn-1", name))).unwrap()
}

#[tokio::test]
async fn fallback_engages_when_primary_fails() {
    let mut src = Fallback::new(Failing, Fixed(fixed_sample("native")));
    let s = src.sample().await.expect("fallback answers");
    assert_eq!(s.host.name, "native");
}

#[tokio::test]
async fn fallback_unused_when_primary_succeeds() {
    let mut src = Fallback::new(Fixed(fixed_sample("exporter")), Failing);
    let s = src.sample().await.expect("primary answers");
    assert_eq!(s.host.name, "exporter");
}

#[tokio::test]
async fn unreachable_exporter_is_a_fetch_error() {
    // port 9 (discard) on localhost is closed in test environments
    let url = "http://127.0.0.1:9/metrics".parse().unwrap();
    let mut src = ExporterSource::new(url, Duration::from_millis(500)).unwrap();
    let err = src.sample().await.unwrap_err();
    assert!(matches!(err, SampleError::Fetch(_)));
}
