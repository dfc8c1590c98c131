//! Entry point for the vpnstat agent. Parses args, then reports on a fixed interval.

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;
use vpnstat_agent::activity_file::ActivityFile;
use vpnstat_agent::config::{parse_args, AgentConfig, USAGE};
use vpnstat_agent::sampler::{collect, spawn_reporter};
use vpnstat_agent::transport::ReportTransport;
use vpnstat_probe::ConfiguredSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args(env::args()) {
        Ok(a) if a.help => {
            eprintln!("{USAGE}");
            return Ok(());
        }
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cfg = AgentConfig::from_env(&args)?;
    let mut source = ConfiguredSource::new(cfg.exporter_url.clone(), cfg.interval)?;
    let activity = cfg.activity_file.clone().map(ActivityFile::new);

    if args.dry_run {
        if let Some(sample) = collect(&mut source, activity.as_ref()).await {
            println!("{}", serde_json::to_string_pretty(&sample)?);
        }
        return Ok(());
    }

    let transport = ReportTransport::new(&cfg.server_url, cfg.api_key.clone(), cfg.interval)?;
    info!(
        "agent started, sending stats to {} every {}s",
        transport.endpoint(),
        cfg.interval.as_secs()
    );
    if let Some(url) = &cfg.exporter_url {
        info!("sampling via exporter at {url} (native fallback)");
    }
    if let Some(file) = &activity {
        info!("reading activity from {}", file.path().display());
    }

    let reporter = spawn_reporter(source, activity, transport, cfg.interval);
    tokio::select! {
        res = reporter => { res?; }
        _ = tokio::signal::ctrl_c() => { info!("shutting down"); }
    }
    Ok(())
}
