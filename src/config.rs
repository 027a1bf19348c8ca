//! Configuration system using Figment
//!
//! This module provides strongly-typed configuration loading for the application.
//! Configuration is loaded from:
//! 1. config/motion.toml file (base configuration)
//! 2. Environment variables (prefixed with MOTION_DAQ_)
//!
//! Every field carries a default so the application runs with no file present.
//!
//! # Example
//! ```no_run
//! use motion_daq::config::MotionConfig;
//!
//! # fn main() -> Result<(), figment::Error> {
//! let config = MotionConfig::load()?;
//! println!("Application: {}", config.application.name);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::validation;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Movement-detection settings
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Feature-computation settings
    #[serde(default)]
    pub features: FeatureConfig,
    /// Sensor link settings
    #[serde(default)]
    pub link: LinkConfig,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            detection: DetectionConfig::default(),
            features: FeatureConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

/// Movement-detection configuration consumed by the segmentation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Total-acceleration threshold that starts or extends an event, in g units
    #[serde(default = "default_threshold_g")]
    pub threshold_g: f64,
    /// Maximum gap since the last trigger before an active event is finished
    #[serde(with = "humantime_serde", default = "default_hysteresis")]
    pub hysteresis: Duration,
    /// Number of samples retained before a movement is detected
    #[serde(default = "default_preroll_capacity")]
    pub preroll_capacity: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold_g: default_threshold_g(),
            hysteresis: default_hysteresis(),
            preroll_capacity: default_preroll_capacity(),
        }
    }
}

/// Feature-computation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Scale factor converting raw device timestamp units to seconds
    #[serde(default = "default_time_units")]
    pub time_units: f64,
    /// Ambient gravity subtracted from total acceleration, in g units
    #[serde(default = "default_gravity_offset")]
    pub gravity_offset_g: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            time_units: default_time_units(),
            gravity_offset_g: default_gravity_offset(),
        }
    }
}

/// Sensor link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Advertised name of the sensor device
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Capacity of the broadcast channel carrying decoded samples
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// How often the consumer polls for a completed event
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Sample emission rate of the mock sensor, in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,
    /// Gap between synthetic movement bursts emitted by the mock sensor
    #[serde(with = "humantime_serde", default = "default_burst_interval")]
    pub burst_interval: Duration,
    /// Length of each synthetic movement burst
    #[serde(with = "humantime_serde", default = "default_burst_duration")]
    pub burst_duration: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            channel_capacity: default_channel_capacity(),
            poll_interval: default_poll_interval(),
            sample_rate_hz: default_sample_rate(),
            burst_interval: default_burst_interval(),
            burst_duration: default_burst_duration(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "Motion DAQ".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_threshold_g() -> f64 {
    1.2
}

fn default_hysteresis() -> Duration {
    Duration::from_secs(1)
}

fn default_preroll_capacity() -> usize {
    20
}

fn default_time_units() -> f64 {
    0.001
}

fn default_gravity_offset() -> f64 {
    1.0
}

fn default_device_name() -> String {
    "AccelerationMonitor".to_string()
}

fn default_channel_capacity() -> usize {
    256
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_sample_rate() -> f64 {
    100.0
}

fn default_burst_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_burst_duration() -> Duration {
    Duration::from_millis(600)
}

impl MotionConfig {
    /// Load configuration from config/motion.toml and environment variables
    ///
    /// Environment variables can override configuration with prefix MOTION_DAQ_
    /// Example: MOTION_DAQ_APPLICATION_NAME=bench
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/motion.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("MOTION_DAQ_").split("_"))
            .extract()
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        validation::is_strictly_positive(self.detection.threshold_g)
            .map_err(|e| format!("detection.threshold_g: {e}"))?;
        validation::is_nonzero_capacity(self.detection.preroll_capacity)
            .map_err(|e| format!("detection.preroll_capacity: {e}"))?;
        if self.detection.hysteresis.is_zero() {
            return Err("detection.hysteresis must be greater than zero".to_string());
        }

        validation::is_strictly_positive(self.features.time_units)
            .map_err(|e| format!("features.time_units: {e}"))?;
        validation::is_finite_number(self.features.gravity_offset_g)
            .map_err(|e| format!("features.gravity_offset_g: {e}"))?;

        validation::is_nonzero_capacity(self.link.channel_capacity)
            .map_err(|e| format!("link.channel_capacity: {e}"))?;
        validation::is_strictly_positive(self.link.sample_rate_hz)
            .map_err(|e| format!("link.sample_rate_hz: {e}"))?;
        if self.link.poll_interval.is_zero() {
            return Err("link.poll_interval must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MotionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.threshold_g, 1.2);
        assert_eq!(config.detection.preroll_capacity, 20);
        assert_eq!(config.detection.hysteresis, Duration::from_secs(1));
        assert_eq!(config.features.time_units, 0.001);
        assert_eq!(config.features.gravity_offset_g, 1.0);
    }

    #[test]
    fn invalid_log_level_rejected() {
        let mut config = MotionConfig::default();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_preroll_capacity_rejected() {
        let mut config = MotionConfig::default();
        config.detection.preroll_capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("preroll_capacity"));
    }

    #[test]
    fn non_positive_time_units_rejected() {
        let mut config = MotionConfig::default();
        config.features.time_units = 0.0;
        assert!(config.validate().is_err());

        config.features.time_units = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_threshold_rejected() {
        let mut config = MotionConfig::default();
        config.detection.threshold_g = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_full_toml_document() {
        let toml = r#"
            [application]
            name = "Bench Rig"
            log_level = "debug"

            [detection]
            threshold_g = 1.5
            hysteresis = "750ms"
            preroll_capacity = 10

            [features]
            time_units = 0.000001
            gravity_offset_g = 0.98

            [link]
            device_name = "BenchSensor"
            poll_interval = "250ms"
        "#;
        let config: MotionConfig = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .unwrap();

        assert_eq!(config.application.name, "Bench Rig");
        assert_eq!(config.detection.threshold_g, 1.5);
        assert_eq!(config.detection.hysteresis, Duration::from_millis(750));
        assert_eq!(config.detection.preroll_capacity, 10);
        assert_eq!(config.features.time_units, 0.000001);
        assert_eq!(config.link.device_name, "BenchSensor");
        assert_eq!(config.link.poll_interval, Duration::from_millis(250));
        // Unspecified sections fall back to defaults
        assert_eq!(config.link.channel_capacity, 256);
        assert!(config.validate().is_ok());
    }
}
