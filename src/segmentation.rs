//! Movement-detection state machine.
//!
//! This module contains the stateful core of the pipeline: a bounded pre-roll
//! buffer of recent samples, and the [`SegmentationEngine`] that consumes one
//! sample per call and cuts the stream into discrete movement events using an
//! amplitude threshold with time-based hysteresis.
//!
//! # Detection model
//!
//! The engine is a two-state machine, **Idle** and **Active**:
//!
//! - While Idle, every sample lands in the pre-roll buffer. A sample whose
//!   total acceleration exceeds the threshold triggers the Active state; the
//!   buffered pre-roll is moved into the new event so the event includes the
//!   motion context *before* the crossing (the triggering instant is the
//!   middle of a gesture, not its start).
//! - While Active, samples append to the in-progress event. Each new trigger
//!   re-arms the hysteresis window; once a sample arrives after the window has
//!   lapsed, the event is sealed. That boundary sample belongs to neither
//!   event: it seeds the pre-roll buffer for the next one.
//!
//! Timing is read from an injectable [`Clock`] so the hysteresis behavior is
//! deterministically testable without real-time delays.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::MotionConfig;
use crate::core::{MotionEvent, Sample};
use crate::error::{AppResult, MotionError};
use crate::validation;

/// Capability: monotonic time source.
///
/// `now` returns the elapsed time since an arbitrary fixed origin. The engine
/// only ever compares two readings from the same clock, so the origin does not
/// matter as long as readings never move backwards.
pub trait Clock: Send + Sync {
    /// Current reading of the clock.
    fn now(&self) -> Duration;
}

/// Wall clock anchored at construction time.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock with its origin at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for deterministic tests.
///
/// Cloning yields a handle to the same underlying time, so a test can keep one
/// handle and give another to the engine.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.nanos
            .fetch_add(delta.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Fixed-capacity FIFO of the samples seen while no event is active.
///
/// Insertion past capacity evicts the oldest sample. This is a pure bounded
/// buffer with no error conditions.
#[derive(Debug)]
pub struct PreRollBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl PreRollBuffer {
    /// Create a buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest entry if the buffer is full.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Return and remove all held samples, preserving arrival order.
    pub fn drain(&mut self) -> Vec<Sample> {
        self.samples.drain(..).collect()
    }

    /// Whether the buffer currently holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Configured maximum number of samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Stateful movement detector.
///
/// Feed one [`Sample`] per call into [`ingest`](Self::ingest); retrieve at most
/// one completed [`MotionEvent`] per call from
/// [`try_take_completed`](Self::try_take_completed). Both operations are
/// non-blocking and O(buffer size); they must be serialized against the same
/// engine instance (single task or an external guard).
pub struct SegmentationEngine {
    threshold_g: f64,
    hysteresis: Duration,
    preroll: PreRollBuffer,
    in_progress: Vec<Sample>,
    completed: Option<MotionEvent>,
    last_trigger: Option<Duration>,
    clock: Box<dyn Clock>,
}

impl SegmentationEngine {
    /// Create an engine using the wall clock.
    pub fn new(config: &MotionConfig) -> AppResult<Self> {
        Self::with_clock(config, Box::new(SystemClock::new()))
    }

    /// Create an engine with an injected clock.
    ///
    /// Fails with a configuration error if the time scale is not strictly
    /// positive, the pre-roll capacity is zero, or the threshold is not a
    /// positive finite number.
    pub fn with_clock(config: &MotionConfig, clock: Box<dyn Clock>) -> AppResult<Self> {
        validation::is_strictly_positive(config.features.time_units)
            .map_err(|e| MotionError::Configuration(format!("features.time_units: {e}")))?;
        validation::is_nonzero_capacity(config.detection.preroll_capacity)
            .map_err(|e| MotionError::Configuration(format!("detection.preroll_capacity: {e}")))?;
        validation::is_strictly_positive(config.detection.threshold_g)
            .map_err(|e| MotionError::Configuration(format!("detection.threshold_g: {e}")))?;

        Ok(Self {
            threshold_g: config.detection.threshold_g,
            hysteresis: config.detection.hysteresis,
            preroll: PreRollBuffer::new(config.detection.preroll_capacity),
            in_progress: Vec::new(),
            completed: None,
            last_trigger: None,
            clock,
        })
    }

    /// Consume one sample and advance the state machine.
    ///
    /// A sample whose magnitude exceeds the threshold re-arms the hysteresis
    /// window. While the window is open the sample joins the in-progress
    /// event; otherwise it becomes pre-roll context for the next event, and a
    /// previously open event is sealed for retrieval. The sample that closes
    /// an event is excluded from it.
    pub fn ingest(&mut self, sample: Sample) {
        let now = self.clock.now();

        if sample.total_acceleration() > self.threshold_g {
            self.last_trigger = Some(now);
        }

        let within_window = self
            .last_trigger
            .map(|t| now.saturating_sub(t) < self.hysteresis)
            .unwrap_or(false);

        if within_window {
            if !self.preroll.is_empty() {
                // Idle -> Active: buffered context becomes the head of the event.
                debug!(
                    preroll = self.preroll.len(),
                    "movement detected, starting event with pre-roll context"
                );
                self.in_progress.extend(self.preroll.drain());
            }
            self.in_progress.push(sample);
        } else {
            if self.last_trigger.is_some() {
                // The window lapsed: seal the event without the current sample.
                let samples = std::mem::take(&mut self.in_progress);
                debug!(samples = samples.len(), "hysteresis expired, event sealed");
                self.completed = Some(MotionEvent::from_samples(samples));
            }
            self.preroll.push(sample);
            self.last_trigger = None;
        }
    }

    /// Take the completed event, if one is ready.
    ///
    /// This is a destructive single read: the event is handed off at most
    /// once, and a second call without an intervening completion returns
    /// `None`. `None` is the normal no-data case, not an error. Taking never
    /// touches the pre-roll buffer or an event already in progress.
    pub fn try_take_completed(&mut self) -> Option<MotionEvent> {
        self.completed.take()
    }

    /// Whether an event is currently being recorded.
    pub fn is_active(&self) -> bool {
        self.last_trigger.is_some()
    }

    /// Number of samples currently buffered as pre-roll context.
    pub fn preroll_len(&self) -> usize {
        self.preroll.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionConfig;

    fn quiet(ts: u32) -> Sample {
        Sample {
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 0.9,
            accel_timestamp: ts,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
        }
    }

    fn loud(ts: u32) -> Sample {
        Sample {
            accel_x: 2.0,
            accel_y: 0.0,
            accel_z: 0.0,
            accel_timestamp: ts,
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
        }
    }

    fn engine_with_clock(clock: ManualClock) -> SegmentationEngine {
        let config = MotionConfig::default();
        SegmentationEngine::with_clock(&config, Box::new(clock)).unwrap()
    }

    #[test]
    fn preroll_never_exceeds_capacity() {
        let mut buffer = PreRollBuffer::new(3);
        for ts in 0..10 {
            buffer.push(quiet(ts));
        }
        assert_eq!(buffer.len(), 3);
        let stamps: Vec<u32> = buffer.drain().iter().map(|s| s.accel_timestamp).collect();
        assert_eq!(stamps, vec![7, 8, 9]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn quiet_stream_stays_idle() {
        let clock = ManualClock::new();
        let mut engine = engine_with_clock(clock.clone());

        for ts in 0..5 {
            engine.ingest(quiet(ts));
            clock.advance(Duration::from_millis(10));
        }

        assert!(!engine.is_active());
        assert_eq!(engine.preroll_len(), 5);
        assert!(engine.try_take_completed().is_none());
    }

    #[test]
    fn event_includes_preroll_and_excludes_boundary_sample() {
        let clock = ManualClock::new();
        let mut engine = engine_with_clock(clock.clone());

        engine.ingest(quiet(0));
        clock.advance(Duration::from_millis(100));
        engine.ingest(quiet(100));
        clock.advance(Duration::from_millis(100));
        engine.ingest(loud(200));

        assert!(engine.is_active());
        assert!(engine.try_take_completed().is_none());

        // Move past the hysteresis window; the next quiet sample seals the event.
        clock.advance(Duration::from_millis(1500));
        engine.ingest(quiet(1700));

        let event = engine.try_take_completed().expect("event should be sealed");
        let stamps: Vec<u32> = event.samples().iter().map(|s| s.accel_timestamp).collect();
        assert_eq!(stamps, vec![0, 100, 200]);

        // The boundary sample starts the next pre-roll window.
        assert!(!engine.is_active());
        assert_eq!(engine.preroll_len(), 1);
    }

    #[test]
    fn take_completed_is_idempotent() {
        let clock = ManualClock::new();
        let mut engine = engine_with_clock(clock.clone());

        engine.ingest(loud(0));
        clock.advance(Duration::from_secs(2));
        engine.ingest(quiet(2000));

        assert!(engine.try_take_completed().is_some());
        assert!(engine.try_take_completed().is_none());
    }

    #[test]
    fn retrigger_extends_open_window() {
        let clock = ManualClock::new();
        let mut engine = engine_with_clock(clock.clone());

        engine.ingest(loud(0));
        clock.advance(Duration::from_millis(800));
        // Quiet but still inside the window: keeps recording.
        engine.ingest(quiet(800));
        clock.advance(Duration::from_millis(100));
        // New trigger re-arms the window.
        engine.ingest(loud(900));
        clock.advance(Duration::from_millis(800));
        engine.ingest(quiet(1700));
        assert!(engine.is_active());

        clock.advance(Duration::from_millis(1100));
        engine.ingest(quiet(2800));

        let event = engine.try_take_completed().expect("event should be sealed");
        assert_eq!(event.len(), 4);
    }

    #[test]
    fn taking_does_not_disturb_next_event_in_progress() {
        let clock = ManualClock::new();
        let mut engine = engine_with_clock(clock.clone());

        engine.ingest(loud(0));
        clock.advance(Duration::from_secs(2));
        engine.ingest(quiet(2000)); // seals first event, seeds pre-roll
        clock.advance(Duration::from_millis(10));
        engine.ingest(loud(2010)); // second event begins

        let first = engine.try_take_completed().expect("first event ready");
        assert_eq!(first.len(), 1);
        assert!(engine.is_active());

        clock.advance(Duration::from_secs(2));
        engine.ingest(quiet(4010));
        let second = engine.try_take_completed().expect("second event ready");
        let stamps: Vec<u32> = second.samples().iter().map(|s| s.accel_timestamp).collect();
        assert_eq!(stamps, vec![2000, 2010]);
    }

    #[test]
    fn zero_time_units_rejected_at_construction() {
        let mut config = MotionConfig::default();
        config.features.time_units = 0.0;
        let result = SegmentationEngine::new(&config);
        assert!(matches!(result, Err(MotionError::Configuration(_))));
    }

    #[test]
    fn negative_time_units_rejected_at_construction() {
        let mut config = MotionConfig::default();
        config.features.time_units = -1.0;
        assert!(SegmentationEngine::new(&config).is_err());
    }

    #[test]
    fn zero_preroll_capacity_rejected_at_construction() {
        let mut config = MotionConfig::default();
        config.detection.preroll_capacity = 0;
        let result = SegmentationEngine::new(&config);
        assert!(matches!(result, Err(MotionError::Configuration(_))));
    }

    #[test]
    fn manual_clock_handles_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(handle.now(), Duration::from_millis(250));
    }
}
