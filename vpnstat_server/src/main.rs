//! Entry point for the vpnstat collector.

use std::{env, net::SocketAddr};

use tracing::info;
use tracing_subscriber::EnvFilter;
use vpnstat_server::config::{wants_help, ServerConfig, USAGE};
use vpnstat_server::gateway::Collector;
use vpnstat_server::router;
use vpnstat_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if wants_help(env::args()) {
        eprintln!("{USAGE}");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::from_env()?;
    let state = AppState::new(Collector::new(cfg.api_key), cfg.bot_token);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("collector running at http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
