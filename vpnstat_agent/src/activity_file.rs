//! Side-channel activity snapshot written by an external input tracker.

use std::path::{Path, PathBuf};

use tracing::debug;
use vpnstat_probe::{normalize_activity, ActivitySnapshot};

#[derive(Debug, Clone)]
pub struct ActivityFile {
    path: PathBuf,
}

impl ActivityFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and normalize the current snapshot. A missing or unparsable file
    /// means no activity payload for this tick.
    pub async fn read(&self) -> Option<ActivitySnapshot> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) => {
                debug!("activity file {} unreadable: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(raw) => Some(normalize_activity(&raw)),
            Err(e) => {
                debug!("activity file {} is not JSON: {e}", self.path.display());
                None
            }
        }
    }
}
