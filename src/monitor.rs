//! Monitoring session wiring.
//!
//! [`MotionMonitor`] owns one segmentation engine and one feature computer and
//! exposes the two operations of a monitoring tick: `ingest` a sample,
//! `poll` for a completed event. Both must run on the same task (or behind an
//! external guard); [`run_session`] provides that serialization by driving a
//! sample stream and a poll interval from a single `select!` loop.

use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::config::MotionConfig;
use crate::core::{Sample, SampleSource};
use crate::error::AppResult;
use crate::features::{EventFeatures, FeatureComputer, PeakHistory};
use crate::segmentation::SegmentationEngine;

/// Owns the segmentation engine and feature computer for one session.
///
/// Constructed once per monitoring session and discarded at session end; no
/// process-wide state is involved.
pub struct MotionMonitor {
    engine: SegmentationEngine,
    computer: FeatureComputer,
}

impl MotionMonitor {
    /// Build a monitor from configuration, using the wall clock.
    pub fn new(config: &MotionConfig) -> AppResult<Self> {
        Ok(Self {
            engine: SegmentationEngine::new(config)?,
            computer: FeatureComputer::new(config)?,
        })
    }

    /// Assemble a monitor from already-constructed components.
    ///
    /// Useful when the engine needs an injected clock.
    pub fn from_parts(engine: SegmentationEngine, computer: FeatureComputer) -> Self {
        Self { engine, computer }
    }

    /// Feed one decoded sample into the detector.
    pub fn ingest(&mut self, sample: Sample) {
        self.engine.ingest(sample);
    }

    /// Poll for a completed event and compute its features.
    ///
    /// Returns `Ok(None)` when no event is ready, which is the common case
    /// while motion is still being monitored.
    pub fn poll(&mut self) -> AppResult<Option<EventFeatures>> {
        match self.engine.try_take_completed() {
            Some(event) => Ok(Some(self.computer.process(event)?)),
            None => Ok(None),
        }
    }

    /// The running peak history, sentinel included.
    pub fn peak_history(&self) -> &PeakHistory {
        self.computer.history()
    }

    /// Whether an event is currently being recorded.
    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }
}

/// Drive a monitoring session until shutdown.
///
/// Subscribes to the source's sample stream and interleaves sample ingestion
/// with event polling on one task. Each completed event is handed to
/// `on_event`. The loop ends when the shutdown signal fires or the sample
/// channel closes; a final poll catches an event sealed right before the end.
pub async fn run_session<F>(
    source: &mut dyn SampleSource,
    monitor: &mut MotionMonitor,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut on_event: F,
) -> AppResult<()>
where
    F: FnMut(&EventFeatures),
{
    let mut samples = source.sample_stream().await?;
    let mut ticker = tokio::time::interval(poll_interval);
    debug!(source = %source.name(), "monitoring session started");

    loop {
        tokio::select! {
            received = samples.recv() => match received {
                Ok(sample) => monitor.ingest(sample),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "sample consumer lagged behind the link");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("sample channel closed, ending session");
                    break;
                }
            },
            _ = ticker.tick() => {
                if let Some(features) = monitor.poll()? {
                    on_event(&features);
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    if let Some(features) = monitor.poll()? {
        on_event(&features);
    }
    Ok(())
}
