//! Collector configuration from the environment and command line.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_KEY: &str = "dev-secret-key";

pub const USAGE: &str = "Usage: vpnstat_server [--port PORT|-p PORT]\n\
Environment: PORT, API_KEY, BOT_TOKEN (required)";

/// `--port N`, `-p N` or `--port=N`; the long form wins. Falls back to
/// `default_port` when absent or unparsable.
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}

pub fn wants_help<I: IntoIterator<Item = String>>(args: I) -> bool {
    args.into_iter().skip(1).any(|a| a == "-h" || a == "--help")
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub api_key: String,
    pub bot_token: String,
}

impl ServerConfig {
    /// Flags override `PORT`; `BOT_TOKEN` must be set and non-empty.
    pub fn resolve(
        args: Vec<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let env_port = lookup("PORT")
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let bot_token = lookup("BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("BOT_TOKEN is required"))?;
        Ok(Self {
            port: parse_port(args, env_port),
            api_key: lookup("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            bot_token,
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::resolve(std::env::args().collect(), |k| std::env::var(k).ok())
    }
}
