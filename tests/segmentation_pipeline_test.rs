//! End-to-end tests for the segmentation and feature pipeline.
//!
//! Drives the engine with a hand-controlled clock so hysteresis behavior is
//! exercised without real-time delays.

use std::time::Duration;

use motion_daq::config::MotionConfig;
use motion_daq::core::Sample;
use motion_daq::features::FeatureComputer;
use motion_daq::monitor::MotionMonitor;
use motion_daq::segmentation::{ManualClock, SegmentationEngine};

fn sample(ax: f32, ay: f32, az: f32, ts: u32) -> Sample {
    Sample {
        accel_x: ax,
        accel_y: ay,
        accel_z: az,
        accel_timestamp: ts,
        gyro_x: 0.0,
        gyro_y: 0.0,
        gyro_z: 0.0,
    }
}

fn engine(config: &MotionConfig, clock: &ManualClock) -> SegmentationEngine {
    SegmentationEngine::with_clock(config, Box::new(clock.clone())).unwrap()
}

#[test]
fn end_to_end_scenario() {
    let config = MotionConfig::default();
    let clock = ManualClock::new();
    let mut engine = engine(&config, &clock);

    // Two quiet samples (magnitude ~0.9, below the 1.2 threshold): engine
    // stays idle and both land in the pre-roll buffer.
    engine.ingest(sample(0.0, 0.0, 0.9, 0));
    clock.advance(Duration::from_millis(100));
    engine.ingest(sample(0.0, 0.0, 0.9, 100));

    assert!(!engine.is_active());
    assert_eq!(engine.preroll_len(), 2);
    assert!(engine.try_take_completed().is_none());

    // Magnitude 2.0 > 1.2: transition to Active; the event absorbs the
    // pre-roll plus the triggering sample.
    clock.advance(Duration::from_millis(100));
    engine.ingest(sample(2.0, 0.0, 0.0, 200));
    assert!(engine.is_active());
    assert_eq!(engine.preroll_len(), 0);

    // A late low-magnitude sample beyond the hysteresis window seals the
    // three-sample event; the late sample itself is excluded and seeds the
    // next pre-roll window.
    clock.advance(Duration::from_millis(1500));
    engine.ingest(sample(0.0, 0.0, 0.9, 1700));

    let event = engine.try_take_completed().expect("event should be ready");
    let stamps: Vec<u32> = event.samples().iter().map(|s| s.accel_timestamp).collect();
    assert_eq!(stamps, vec![0, 100, 200]);

    assert_eq!(engine.preroll_len(), 1);
    assert!(engine.try_take_completed().is_none());
}

#[test]
fn preroll_keeps_only_last_capacity_samples() {
    let mut config = MotionConfig::default();
    config.detection.preroll_capacity = 4;
    let clock = ManualClock::new();
    let mut engine = engine(&config, &clock);

    for ts in 0..10u32 {
        engine.ingest(sample(0.0, 0.0, 0.5, ts));
        clock.advance(Duration::from_millis(10));
    }
    assert_eq!(engine.preroll_len(), 4);

    // Trigger: the event starts with exactly the last four pre-roll samples.
    engine.ingest(sample(2.0, 0.0, 0.0, 10));
    clock.advance(Duration::from_secs(2));
    engine.ingest(sample(0.0, 0.0, 0.5, 2010));

    let event = engine.try_take_completed().expect("event should be ready");
    let stamps: Vec<u32> = event.samples().iter().map(|s| s.accel_timestamp).collect();
    assert_eq!(stamps, vec![6, 7, 8, 9, 10]);
}

#[test]
fn pipeline_produces_features_and_history() {
    let config = MotionConfig::default();
    let clock = ManualClock::new();
    let engine = engine(&config, &clock);
    let computer = FeatureComputer::new(&config).unwrap();
    let mut monitor = MotionMonitor::from_parts(engine, computer);

    // Quiet lead-in, one burst, quiet tail past the window.
    monitor.ingest(sample(0.0, 0.0, 0.9, 0));
    clock.advance(Duration::from_millis(10));
    monitor.ingest(sample(2.5, 0.0, 0.0, 10));
    clock.advance(Duration::from_millis(10));
    monitor.ingest(sample(1.8, 0.0, 0.0, 20));
    clock.advance(Duration::from_millis(1100));
    monitor.ingest(sample(0.0, 0.0, 0.9, 1120));

    let features = monitor.poll().unwrap().expect("event expected");

    // Rows are annotated in arrival order; first elapsed is zero.
    let rows = features.table.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].elapsed_seconds, 0.0);
    assert!((rows[1].elapsed_seconds - 0.010).abs() < 1e-9);
    assert!((rows[2].elapsed_seconds - 0.020).abs() < 1e-9);

    // magnitude = sqrt(ax²+ay²+az²) - offset for every row.
    for row in rows {
        let expected = row.sample.total_acceleration() - 1.0;
        assert!((row.magnitude - expected).abs() < 1e-9);
    }

    // Peak is the burst sample, delta measured against the sentinel 0.
    assert!((features.peak - 1.5).abs() < 1e-6);
    assert!((features.delta - 1.5).abs() < 1e-6);

    // History: sentinel + one event.
    assert_eq!(monitor.peak_history().len(), 2);
    assert_eq!(monitor.peak_history().peaks()[0], 0.0);

    // No second event.
    assert!(monitor.poll().unwrap().is_none());
}

#[test]
fn successive_events_track_peak_deltas() {
    let config = MotionConfig::default();
    let clock = ManualClock::new();
    let engine = engine(&config, &clock);
    let computer = FeatureComputer::new(&config).unwrap();
    let mut monitor = MotionMonitor::from_parts(engine, computer);

    let mut ts = 0u32;
    let mut run_burst = |monitor: &mut MotionMonitor, amplitude: f32| {
        monitor.ingest(sample(amplitude, 0.0, 0.0, ts));
        clock.advance(Duration::from_secs(2));
        ts += 2000;
        monitor.ingest(sample(0.0, 0.0, 0.9, ts));
        clock.advance(Duration::from_millis(10));
        ts += 10;
        monitor.poll().unwrap().expect("event expected")
    };

    let first = run_burst(&mut monitor, 3.0);
    assert!((first.peak - 2.0).abs() < 1e-6);
    assert!((first.delta - 2.0).abs() < 1e-6);

    let second = run_burst(&mut monitor, 2.0);
    assert!((second.peak - 1.0).abs() < 1e-6);
    assert!((second.delta - (-1.0)).abs() < 1e-6);

    let trend = monitor.peak_history().trend();
    assert!((trend.peak - 1.0).abs() < 1e-6);
    assert!((trend.delta - (-1.0)).abs() < 1e-6);
    assert_eq!(monitor.peak_history().len(), 3);
}

#[test]
fn construction_fails_for_invalid_time_units() {
    let mut config = MotionConfig::default();
    config.features.time_units = 0.0;

    assert!(SegmentationEngine::new(&config).is_err());
    assert!(FeatureComputer::new(&config).is_err());
    assert!(MotionMonitor::new(&config).is_err());
}
