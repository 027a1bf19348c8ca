//! Core traits and data types for the motion pipeline.
use crate::error::MotionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A single tick of combined accelerometer/gyroscope data.
///
/// Linear acceleration is expressed in units of standard gravity; angular rate
/// in the device's native units. Only the accelerometer timestamp flows through
/// the pipeline: the gyroscope timestamp present on the wire is dropped at
/// decode time (see [`crate::link::protocol`]).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// X-axis linear acceleration, in g
    pub accel_x: f32,
    /// Y-axis linear acceleration, in g
    pub accel_y: f32,
    /// Z-axis linear acceleration, in g
    pub accel_z: f32,
    /// Raw timestamp from the accelerometer subsystem
    pub accel_timestamp: u32,
    /// X-axis angular rate
    pub gyro_x: f32,
    /// Y-axis angular rate
    pub gyro_y: f32,
    /// Z-axis angular rate
    pub gyro_z: f32,
}

impl Sample {
    /// Total acceleration magnitude `sqrt(ax² + ay² + az²)`, in g.
    ///
    /// This is the raw magnitude without gravity compensation; the feature
    /// computer subtracts the configured gravity offset on top of it.
    pub fn total_acceleration(&self) -> f64 {
        let ax = f64::from(self.accel_x);
        let ay = f64::from(self.accel_y);
        let az = f64::from(self.accel_z);
        (ax * ax + ay * ay + az * az).sqrt()
    }
}

/// An ordered, non-empty sequence of samples spanning one detected movement.
///
/// Events are built and exclusively owned by the segmentation engine until
/// handed off to the feature computer by value; the engine retains no
/// reference afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionEvent {
    samples: Vec<Sample>,
}

impl MotionEvent {
    /// Wrap an ordered sample sequence into an event.
    pub(crate) fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// The samples in arrival order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples in the event.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the event holds no samples. The engine never emits an empty
    /// event; this exists for the feature computer's contract check.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the event, yielding its samples.
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

/// Trait for any source of decoded sensor samples.
///
/// This trait defines the common interface for sensor links, allowing the
/// monitoring session to be driven by real hardware or a mock in a generic way.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Returns the name of the source.
    fn name(&self) -> String;

    /// Connects to the source and starts sample delivery.
    async fn connect(&mut self) -> Result<(), MotionError>;

    /// Disconnects from the source and stops sample delivery.
    async fn disconnect(&mut self) -> Result<(), MotionError>;

    /// Returns a stream of decoded samples from the source.
    async fn sample_stream(&mut self) -> Result<broadcast::Receiver<Sample>, MotionError>;
}
