//! # Motion DAQ Core Library
//!
//! This crate serves as the core library for the `motion_daq` application. It encapsulates
//! the components required to turn a continuous stream of wireless IMU samples into discrete
//! movement events with derived acceleration features. By organizing the project as a
//! library, the segmentation and feature pipeline can be shared between the headless CLI
//! binary (`main.rs`) and future frontends.
//!
//! ## Crate Structure
//!
//! The library is organized into several modules, each with a distinct responsibility:
//!
//! - **`core`**: Fundamental data types (`Sample`, `MotionEvent`) and the `SampleSource`
//!   trait that abstracts anything able to deliver a decoded sensor stream.
//! - **`config`**: Strongly-typed configuration loaded from TOML files and environment
//!   variables. See [`config::MotionConfig`].
//! - **`segmentation`**: The movement-detection state machine: pre-roll buffering,
//!   threshold trigger, and time-based hysteresis. See [`segmentation::SegmentationEngine`].
//! - **`features`**: Per-event feature computation: elapsed time, gravity-compensated
//!   total acceleration, and the running peak history.
//! - **`monitor`**: Session wiring that owns one engine and one feature computer and
//!   drives them from a sample stream.
//! - **`link`**: The wireless-link boundary: notification payload codec and a mock
//!   sensor implementation for hardware-free operation.
//! - **`error`**: The custom [`error::MotionError`] enum for centralized error handling.
//! - **`telemetry`**: Structured logging infrastructure built on `tracing`.
//! - **`validation`**: Utility functions for validating configuration parameters.

pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod link;
pub mod monitor;
pub mod segmentation;
pub mod telemetry;
pub mod validation;
