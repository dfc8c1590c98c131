//! Sample acquisition strategies.
//!
//! [`NativeSource`] reads the local OS, [`ExporterSource`] scrapes an
//! exporter's text endpoint, and [`Fallback`] composes the two so a failed
//! scrape degrades to native sampling.

mod exporter;
mod native;

pub use exporter::{parse_exporter_text, sample_from_exporter, ExporterMetrics, ExporterSource};
pub use native::{parse_proc_net_dev, parse_proc_stat, parse_tcp_established, NativeSource};

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::types::Sample;

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("exporter fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("exporter returned status {0}")]
    Status(u16),
    #[error("exporter body unusable: {0}")]
    Parse(String),
}

/// Anything that can produce a [`Sample`].
pub trait SampleSource {
    fn sample(&mut self) -> impl Future<Output = Result<Sample, SampleError>> + Send;
}

/// Tries `primary`; on error logs and samples from `fallback` instead.
pub struct Fallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> Fallback<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> SampleSource for Fallback<P, F>
where
    P: SampleSource + Send,
    F: SampleSource + Send,
{
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        match self.primary.sample().await {
            Ok(s) => Ok(s),
            Err(e) => {
                warn!("primary sample source failed, using fallback: {e}");
                self.fallback.sample().await
            }
        }
    }
}

/// The strategy picked by configuration.
pub enum ConfiguredSource {
    Native(NativeSource),
    Exporter(Fallback<ExporterSource, NativeSource>),
}

impl ConfiguredSource {
    /// Exporter-text with native fallback when `exporter` is set, else native.
    /// The exporter fetch is bounded by `timeout`.
    pub fn new(exporter: Option<Url>, timeout: Duration) -> Result<Self, SampleError> {
        Ok(match exporter {
            Some(url) => ConfiguredSource::Exporter(Fallback::new(
                ExporterSource::new(url, timeout)?,
                NativeSource::new(),
            )),
            None => ConfiguredSource::Native(NativeSource::new()),
        })
    }
}

impl SampleSource for ConfiguredSource {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        match self {
            ConfiguredSource::Native(s) => s.sample().await,
            ConfiguredSource::Exporter(s) => s.sample().await,
        }
    }
}
