//! Collection loop: sample, attach activity, send. One tick at a time on a
//! fixed period; a slow tick makes the loop skip missed ticks rather than
//! stacking them up.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use vpnstat_probe::{Sample, SampleSource};

use crate::activity_file::ActivityFile;
use crate::transport::ReportTransport;

/// Take one sample with the activity snapshot attached (when configured).
pub async fn collect<S: SampleSource>(source: &mut S, activity: Option<&ActivityFile>) -> Option<Sample> {
    let mut sample = match source.sample().await {
        Ok(s) => s,
        Err(e) => {
            warn!("sampling failed: {e}");
            return None;
        }
    };
    if let Some(file) = activity {
        sample.activity = file.read().await;
    }
    Some(sample)
}

/// One tick: collect and send once. Failures are logged and dropped.
pub async fn run_tick<S: SampleSource>(
    source: &mut S,
    activity: Option<&ActivityFile>,
    transport: &ReportTransport,
) -> bool {
    let Some(sample) = collect(source, activity).await else {
        return false;
    };
    match transport.send(&sample).await {
        Ok(()) => {
            info!(
                "stats sent (cpu: {}%, mem: {}%)",
                sample.cpu.usage, sample.memory.percent
            );
            true
        }
        Err(e) => {
            warn!("report dropped: {e}");
            false
        }
    }
}

pub fn spawn_reporter<S>(
    mut source: S,
    activity: Option<ActivityFile>,
    transport: ReportTransport,
    period: Duration,
) -> JoinHandle<()>
where
    S: SampleSource + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            // first tick fires immediately
            ticker.tick().await;
            run_tick(&mut source, activity.as_ref(), &transport).await;
        }
    })
}
