//! Report delivery: one JSON POST per tick, no retries.

use std::time::Duration;

use url::Url;
use vpnstat_probe::Sample;

pub const REPORT_PATH: &str = "/api/stats/report";
pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid collector url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("collector answered {0}")]
    Status(u16),
}

pub struct ReportTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl ReportTransport {
    /// `timeout` bounds each attempt; callers pass the collection interval so a
    /// hung collector never holds up the next tick.
    pub fn new(server_url: &Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: server_url.join(REPORT_PATH)?,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Single attempt. Anything other than 200 is an error for this tick only.
    pub async fn send(&self, sample: &Sample) -> Result<(), TransportError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(sample)
            .send()
            .await?;
        match resp.status().as_u16() {
            200 => Ok(()),
            code => Err(TransportError::Status(code)),
        }
    }
}
