//! Agent configuration from the environment and command line.
//! Flags override environment variables.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_API_KEY: &str = "dev-secret-key";
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_EXPORTER_URL: &str = "http://localhost:9100/metrics";

pub const USAGE: &str =
    "Usage: vpnstat_agent [--server URL|-s URL] [--interval SECS|-i SECS] [--dry-run]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub server: Option<String>,
    pub interval: Option<String>,
    pub dry_run: bool,
    pub help: bool,
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut parsed = ParsedArgs::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "--server" | "-s" => parsed.server = it.next(),
            "--interval" | "-i" => parsed.interval = it.next(),
            "--dry-run" => parsed.dry_run = true,
            _ if arg.starts_with("--server=") => {
                parsed.server = arg.split_once('=').map(|(_, v)| v.to_string());
            }
            _ if arg.starts_with("--interval=") => {
                parsed.interval = arg.split_once('=').map(|(_, v)| v.to_string());
            }
            _ => return Err(format!("Unexpected argument '{arg}'. {USAGE}")),
        }
    }
    Ok(parsed)
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub server_url: Url,
    pub api_key: String,
    pub interval: Duration,
    pub exporter_url: Option<Url>,
    pub activity_file: Option<PathBuf>,
}

/// Non-numeric or zero intervals fall back to the default.
pub fn parse_interval(v: Option<&str>) -> Duration {
    let secs = v
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&s| s > 0)
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    Duration::from_secs(secs)
}

fn flag_on(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl AgentConfig {
    /// Resolve configuration from `lookup` (normally `std::env::var`) and
    /// parsed flags.
    pub fn resolve(
        args: &ParsedArgs,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let server = args
            .server
            .clone()
            .or_else(|| lookup("SERVER_URL"))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = Url::parse(&server)
            .map_err(|e| anyhow::anyhow!("invalid SERVER_URL '{server}': {e}"))?;

        let interval = parse_interval(args.interval.clone().or_else(|| lookup("INTERVAL_SEC")).as_deref());

        let exporter_url = match lookup("USE_EXPORTER").filter(|v| flag_on(v)) {
            Some(_) => {
                let raw = lookup("EXPORTER_URL").unwrap_or_else(|| DEFAULT_EXPORTER_URL.to_string());
                Some(
                    Url::parse(&raw)
                        .map_err(|e| anyhow::anyhow!("invalid EXPORTER_URL '{raw}': {e}"))?,
                )
            }
            None => None,
        };

        Ok(Self {
            server_url,
            api_key: lookup("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            interval,
            exporter_url,
            activity_file: lookup("ACTIVITY_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn from_env(args: &ParsedArgs) -> anyhow::Result<Self> {
        Self::resolve(args, |k| std::env::var(k).ok())
    }
}
