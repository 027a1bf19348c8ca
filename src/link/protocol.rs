//! Notification payload codec.
//!
//! A sensor notification is a fixed 32-byte little-endian block: three `f32`
//! accelerometer axes and the accelerometer timestamp (`u32`), followed by
//! three `f32` gyroscope axes and the gyroscope timestamp (`u32`). The
//! gyroscope timestamp is decoded and discarded: only one timestamp field
//! flows through the pipeline.

use bytes::{Buf, BufMut};

use crate::core::Sample;
use crate::error::MotionError;

/// Size of one notification payload in bytes.
pub const NOTIFICATION_LEN: usize = 32;

/// Characteristic carrying accelerometer notification payloads.
pub const DATA_CHARACTERISTIC: &str = "00001143-0000-1000-8000-00805f9b34fb";

/// Characteristic carrying gyroscope notification payloads.
pub const GYRO_CHARACTERISTIC: &str = "00001142-0000-1000-8000-00805f9b34fb";

/// Decode a raw notification payload into a [`Sample`].
///
/// Payloads of any length other than [`NOTIFICATION_LEN`] are rejected; there
/// is no retry here, malformed payloads are the link layer's problem.
pub fn decode_notification(data: &[u8]) -> Result<Sample, MotionError> {
    if data.len() != NOTIFICATION_LEN {
        return Err(MotionError::PayloadLength {
            expected: NOTIFICATION_LEN,
            actual: data.len(),
        });
    }

    let mut buf = data;
    let accel_x = buf.get_f32_le();
    let accel_y = buf.get_f32_le();
    let accel_z = buf.get_f32_le();
    let accel_timestamp = buf.get_u32_le();
    let gyro_x = buf.get_f32_le();
    let gyro_y = buf.get_f32_le();
    let gyro_z = buf.get_f32_le();
    // Received but never stored; see the module docs.
    let _gyro_timestamp = buf.get_u32_le();

    Ok(Sample {
        accel_x,
        accel_y,
        accel_z,
        accel_timestamp,
        gyro_x,
        gyro_y,
        gyro_z,
    })
}

/// Encode a sample into the wire layout.
///
/// The gyroscope timestamp is not part of [`Sample`], so the caller supplies
/// it separately. Used by the mock sensor and by tests.
pub fn encode_notification(sample: &Sample, gyro_timestamp: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(NOTIFICATION_LEN);
    buf.put_f32_le(sample.accel_x);
    buf.put_f32_le(sample.accel_y);
    buf.put_f32_le(sample.accel_z);
    buf.put_u32_le(sample.accel_timestamp);
    buf.put_f32_le(sample.gyro_x);
    buf.put_f32_le(sample.gyro_y);
    buf.put_f32_le(sample.gyro_z);
    buf.put_u32_le(gyro_timestamp);
    buf
}
