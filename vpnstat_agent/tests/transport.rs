//! Report delivery against a throwaway collector.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use vpnstat_agent::activity_file::ActivityFile;
use vpnstat_agent::sampler::run_tick;
use vpnstat_agent::transport::{ReportTransport, TransportError};
use vpnstat_probe::{CpuInfo, HostInfo, MemoryInfo, NetTotals, Sample, SampleError, SampleSource};

type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

async fn spawn_collector(status: StatusCode) -> (url::Url, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/api/stats/report",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let key = headers
                        .get("x-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    seen.lock().unwrap().push((key, body));
                    status
                },
            ),
        )
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}").parse().unwrap(), seen)
}

fn sample() -> Sample {
    Sample {
        host: HostInfo {
            name: "edge-1".into(),
            status: "online".into(),
            uptime_seconds: 42,
        },
        cpu: CpuInfo { usage: 12.0, cores: 4 },
        memory: MemoryInfo::from_totals(1000, 250),
        network: NetTotals { rx: 10, tx: 20 },
        connections: 3,
        activity: None,
    }
}

struct Fixed;

impl SampleSource for Fixed {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        Ok(sample())
    }
}

#[tokio::test]
async fn posts_json_with_api_key_header() {
    let (url, seen) = spawn_collector(StatusCode::OK).await;
    let t = ReportTransport::new(&url, "k1", Duration::from_secs(2)).unwrap();
    assert_eq!(t.endpoint().path(), "/api/stats/report");
    t.send(&sample()).await.expect("accepted");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (key, body) = &seen[0];
    assert_eq!(key.as_deref(), Some("k1"));
    assert_eq!(body["server"]["name"], "edge-1");
    assert_eq!(body["server"]["uptime"], 42);
    assert_eq!(body["cpu"]["cores"], 4);
    assert_eq!(body["memory"]["used"], 750);
    assert_eq!(body["network"]["tx"], 20);
    assert!(body.get("activity").is_none());
}

#[tokio::test]
async fn non_200_is_an_error_without_retry() {
    let (url, seen) = spawn_collector(StatusCode::UNAUTHORIZED).await;
    let t = ReportTransport::new(&url, "wrong", Duration::from_secs(2)).unwrap();
    let err = t.send(&sample()).await.unwrap_err();
    assert!(matches!(err, TransportError::Status(401)));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_collector_is_a_request_error() {
    let url = "http://127.0.0.1:9".parse().unwrap();
    let t = ReportTransport::new(&url, "k", Duration::from_millis(500)).unwrap();
    assert!(matches!(
        t.send(&sample()).await.unwrap_err(),
        TransportError::Request(_)
    ));
}

#[tokio::test]
async fn tick_attaches_activity_from_side_channel() {
    let (url, seen) = spawn_collector(StatusCode::OK).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.json");
    std::fs::write(&path, r#"{"keysPerMinute":"30","clicksPerMinute":2,"keysByLetter":{"a":4}}"#).unwrap();
    let activity = ActivityFile::new(&path);

    let t = ReportTransport::new(&url, "k", Duration::from_secs(2)).unwrap();
    assert!(run_tick(&mut Fixed, Some(&activity), &t).await);

    let seen = seen.lock().unwrap();
    let body = &seen[0].1;
    assert_eq!(body["activity"]["keysPerMinute"], 30);
    assert_eq!(body["activity"]["clicksPerMinute"], 2);
    assert_eq!(body["activity"]["keysTotal"], 0);
    assert_eq!(body["activity"]["keysByLetter"]["a"], 4);
}

#[tokio::test]
async fn missing_side_channel_sends_without_activity() {
    let (url, seen) = spawn_collector(StatusCode::OK).await;
    let activity = ActivityFile::new("/definitely/not/here.json");
    let t = ReportTransport::new(&url, "k", Duration::from_secs(2)).unwrap();
    assert!(run_tick(&mut Fixed, Some(&activity), &t).await);
    assert!(seen.lock().unwrap()[0].1.get("activity").is_none());
}
