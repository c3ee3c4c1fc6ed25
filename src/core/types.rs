//! Core data types for the acquisition pipeline

use crate::math::orientation::Quaternion;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One fully decoded IMU sample, stamped at acquisition time.
///
/// Immutable once assembled: the loop builds exactly one record per accepted
/// sentence, hands it to the sink, and retains nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Acquisition timestamp, microseconds since the Unix epoch.
    pub timestamp_us: u64,
    /// Sensor reference frame label.
    pub frame_id: String,
    /// Orientation as a unit quaternion (w, x, y, z).
    pub orientation: Quaternion,
    /// Angular velocity (x, y, z), rad/s as reported by the device.
    pub angular_velocity: Vector3<f64>,
    /// Linear acceleration (x, y, z), m/s² as reported by the device.
    pub linear_acceleration: Vector3<f64>,
    /// Magnetic field (x, y, z) in the device's gauss scale.
    pub magnetic_field: Vector3<f64>,
}
