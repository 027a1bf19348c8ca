//! Mock sensor implementation.
//!
//! Provides a simulated IMU device for running the pipeline without physical
//! hardware. The mock emits a quiet stream of roughly 1 g samples with small
//! noise and injects a short high-amplitude burst at a configurable interval,
//! which is enough to exercise the full detect/segment/feature path.
//!
//! Every synthetic sample goes through the wire codec (encode, then decode)
//! before being broadcast, so the mock exercises the same payload path a real
//! link would.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::LinkConfig;
use crate::core::{Sample, SampleSource};
use crate::error::MotionError;
use crate::link::protocol;

/// Simulated IMU sensor emitting synthetic notification payloads.
pub struct MockImuLink {
    config: LinkConfig,
    sample_tx: broadcast::Sender<Sample>,
    // Keeps the channel open while no consumer is subscribed.
    _rx_keeper: broadcast::Receiver<Sample>,
    task_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockImuLink {
    /// Create a mock sensor from link configuration.
    pub fn new(config: &LinkConfig) -> Self {
        let (sample_tx, rx_keeper) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            config: config.clone(),
            sample_tx,
            _rx_keeper: rx_keeper,
            task_handle: None,
            shutdown_tx: None,
        }
    }

    fn emission_plan(&self) -> EmissionPlan {
        let rate = self.config.sample_rate_hz;
        let period = std::time::Duration::from_secs_f64(1.0 / rate);
        EmissionPlan {
            period,
            cycle_ticks: ((self.config.burst_interval.as_secs_f64() * rate).round() as u64).max(1),
            burst_ticks: ((self.config.burst_duration.as_secs_f64() * rate).round() as u64).max(1),
            timestamp_step: ((1000.0 / rate).round() as u32).max(1),
        }
    }
}

struct EmissionPlan {
    period: std::time::Duration,
    cycle_ticks: u64,
    burst_ticks: u64,
    timestamp_step: u32,
}

/// Generate one synthetic sample.
///
/// Quiet samples sit near 1 g on the z axis; burst samples swing the x axis
/// well past any sensible detection threshold.
fn synth_sample(rng: &mut StdRng, timestamp: u32, in_burst: bool) -> Sample {
    let noise = |rng: &mut StdRng| rng.gen_range(-0.03f32..0.03f32);
    let (ax, ay, az) = if in_burst {
        (
            rng.gen_range(1.5f32..3.0f32),
            noise(rng),
            1.0 + noise(rng),
        )
    } else {
        (noise(rng), noise(rng), 1.0 + noise(rng))
    };

    Sample {
        accel_x: ax,
        accel_y: ay,
        accel_z: az,
        accel_timestamp: timestamp,
        gyro_x: rng.gen_range(-5.0f32..5.0f32),
        gyro_y: rng.gen_range(-5.0f32..5.0f32),
        gyro_z: rng.gen_range(-5.0f32..5.0f32),
    }
}

#[async_trait]
impl SampleSource for MockImuLink {
    fn name(&self) -> String {
        self.config.device_name.clone()
    }

    async fn connect(&mut self) -> Result<(), MotionError> {
        if self.task_handle.is_some() {
            return Err(MotionError::Link("mock sensor already connected".into()));
        }

        let plan = self.emission_plan();
        let tx = self.sample_tx.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        debug!(
            device = %self.config.device_name,
            rate_hz = self.config.sample_rate_hz,
            "starting mock sensor emission task"
        );

        let task = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut interval = tokio::time::interval(plan.period);
            let mut tick: u64 = 0;
            let mut timestamp: u32 = 0;

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        let in_burst = tick % plan.cycle_ticks < plan.burst_ticks;
                        let sample = synth_sample(&mut rng, timestamp, in_burst);
                        let payload = protocol::encode_notification(&sample, timestamp);
                        match protocol::decode_notification(&payload) {
                            Ok(decoded) => {
                                let _ = tx.send(decoded);
                            }
                            Err(err) => {
                                warn!(error = %err, "mock sensor produced undecodable payload");
                            }
                        }
                        tick += 1;
                        timestamp = timestamp.wrapping_add(plan.timestamp_step);
                    }
                }
            }
        });

        self.task_handle = Some(task);
        self.shutdown_tx = Some(shutdown_tx);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), MotionError> {
        if let Some(shutdown) = self.shutdown_tx.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task_handle.take() {
            task.await
                .map_err(|e| MotionError::Link(format!("mock sensor task failed: {e}")))?;
        }
        Ok(())
    }

    async fn sample_stream(&mut self) -> Result<broadcast::Receiver<Sample>, MotionError> {
        Ok(self.sample_tx.subscribe())
    }
}
