//! Custom error types for the application.
//!
//! This module defines the primary error type, `MotionError`, for the entire application.
//! Using the `thiserror` crate, it provides a centralized and consistent way to handle
//! different kinds of errors, from configuration issues to malformed sensor payloads.
//!
//! ## Error Hierarchy
//!
//! `MotionError` is an enum that consolidates the error sources:
//!
//! - **`Config`**: Wraps errors from the `figment` loader, typically related to file
//!   parsing or format issues in the configuration files.
//! - **`Configuration`**: Represents semantic errors in the configuration, such as values
//!   that parse correctly but are logically invalid (e.g., a non-positive time scale or a
//!   zero-capacity pre-roll buffer). These are raised at component construction and are
//!   fatal to the affected component instance.
//! - **`PayloadLength`**: A notification payload that does not match the expected wire
//!   size. Decoding is the link layer's responsibility; the core never retries it.
//! - **`Link`**: A general category for errors originating from the sensor link, such as
//!   a closed sample channel or a failed subscription.
//! - **`Processing`**: Errors during feature computation. Feeding an empty event to the
//!   feature computer is a caller contract violation reported through this variant.
//! - **`Io`**: Wraps standard `std::io::Error`.
//!
//! Polling for a completed event when none is ready is *not* an error anywhere in this
//! crate; it is the expected common case and is represented as `Ok(None)`.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, MotionError>;

#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Malformed notification payload: expected {expected} bytes, got {actual}")]
    PayloadLength { expected: usize, actual: usize },

    #[error("Link error: {0}")]
    Link(String),

    #[error("Feature processing error: {0}")]
    Processing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
