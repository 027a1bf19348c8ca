//! Per-event feature computation.
//!
//! Takes a completed [`MotionEvent`] and produces a read-only [`FeatureTable`]
//! annotating every sample with elapsed time and gravity-compensated total
//! acceleration, plus the scalar peak magnitude of the event. Peaks accumulate
//! in an append-only [`PeakHistory`] from which the presentation layer derives
//! its most-recent-peak trend.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::MotionConfig;
use crate::core::{MotionEvent, Sample};
use crate::error::{AppResult, MotionError};
use crate::validation;

/// One annotated sample of a feature table.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FeatureRow {
    /// The underlying sensor sample.
    pub sample: Sample,
    /// Time since the event's first sample, in seconds. Always `0` for the
    /// first row regardless of its raw timestamp value.
    pub elapsed_seconds: f64,
    /// Gravity-compensated total acceleration
    /// `sqrt(ax² + ay² + az²) - gravity_offset`, in g.
    pub magnitude: f64,
}

/// Time-ordered annotated table derived from one completed event.
///
/// Read-only after construction.
#[derive(Clone, Debug, Serialize)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// The annotated rows in event order.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Duration spanned by the event, in seconds.
    pub fn span_seconds(&self) -> f64 {
        self.rows.last().map(|r| r.elapsed_seconds).unwrap_or(0.0)
    }
}

/// Append-only sequence of per-event peak magnitudes.
///
/// Seeded with a sentinel `0` entry so a trend is defined before any event
/// exists. Invariant: `len() == number of processed events + 1`.
#[derive(Clone, Debug, Serialize)]
pub struct PeakHistory {
    peaks: Vec<f64>,
}

impl PeakHistory {
    /// Create a history holding only the sentinel entry.
    pub fn new() -> Self {
        Self { peaks: vec![0.0] }
    }

    fn record(&mut self, peak: f64) {
        self.peaks.push(peak);
    }

    /// The most recent peak (the sentinel `0` before any event exists).
    pub fn latest(&self) -> f64 {
        self.peaks.last().copied().unwrap_or(0.0)
    }

    /// The recorded peaks, sentinel first.
    pub fn peaks(&self) -> &[f64] {
        &self.peaks
    }

    /// Number of entries, including the sentinel.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// Always `false`: the sentinel entry is never removed.
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// Most recent peak and its delta against the second-most-recent entry.
    pub fn trend(&self) -> PeakTrend {
        let peak = self.latest();
        let previous = if self.peaks.len() >= 2 {
            self.peaks[self.peaks.len() - 2]
        } else {
            0.0
        };
        PeakTrend {
            peak,
            delta: peak - previous,
        }
    }
}

impl Default for PeakHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived view of the peak history: latest peak and its change.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PeakTrend {
    /// Most recent per-event peak magnitude, in g.
    pub peak: f64,
    /// Difference against the previous event's peak (against the sentinel `0`
    /// before two events exist).
    pub delta: f64,
}

/// Everything the presentation layer receives for one completed event.
#[derive(Clone, Debug, Serialize)]
pub struct EventFeatures {
    /// Annotated per-sample table.
    pub table: FeatureTable,
    /// Maximum magnitude within the event, in g.
    pub peak: f64,
    /// Change of the peak against the previous event.
    pub delta: f64,
    /// Wall-clock instant the event was processed.
    pub completed_at: DateTime<Utc>,
}

/// Computes per-event features and maintains the peak history.
pub struct FeatureComputer {
    time_units: f64,
    gravity_offset: f64,
    history: PeakHistory,
}

impl FeatureComputer {
    /// Create a computer from configuration.
    ///
    /// Fails with a configuration error if the time scale is not strictly
    /// positive or the gravity offset is not finite. Checked once here, not
    /// per call.
    pub fn new(config: &MotionConfig) -> AppResult<Self> {
        validation::is_strictly_positive(config.features.time_units)
            .map_err(|e| MotionError::Configuration(format!("features.time_units: {e}")))?;
        validation::is_finite_number(config.features.gravity_offset_g)
            .map_err(|e| MotionError::Configuration(format!("features.gravity_offset_g: {e}")))?;

        Ok(Self {
            time_units: config.features.time_units,
            gravity_offset: config.features.gravity_offset_g,
            history: PeakHistory::new(),
        })
    }

    /// Annotate a completed event and record its peak.
    ///
    /// The event must be non-empty; the segmentation engine never emits an
    /// empty one, so an empty input is a caller contract violation.
    pub fn process(&mut self, event: MotionEvent) -> AppResult<EventFeatures> {
        if event.is_empty() {
            return Err(MotionError::Processing(
                "event contains no samples".to_string(),
            ));
        }

        let samples = event.into_samples();
        let first_timestamp = i64::from(samples[0].accel_timestamp);

        let rows: Vec<FeatureRow> = samples
            .iter()
            .map(|sample| self.annotate(sample, first_timestamp))
            .collect();

        let peak = rows
            .iter()
            .fold(f64::NEG_INFINITY, |acc, row| acc.max(row.magnitude));

        let previous = self.history.latest();
        self.history.record(peak);
        let delta = peak - previous;

        info!(samples = rows.len(), peak, delta, "event processed");

        Ok(EventFeatures {
            table: FeatureTable { rows },
            peak,
            delta,
            completed_at: Utc::now(),
        })
    }

    fn annotate(&self, sample: &Sample, first_timestamp: i64) -> FeatureRow {
        let elapsed_units = i64::from(sample.accel_timestamp) - first_timestamp;
        FeatureRow {
            sample: *sample,
            elapsed_seconds: elapsed_units as f64 * self.time_units,
            magnitude: sample.total_acceleration() - self.gravity_offset,
        }
    }

    /// The running peak history, sentinel included.
    pub fn history(&self) -> &PeakHistory {
        &self.history
    }
}
