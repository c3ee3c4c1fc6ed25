//! Euler angle and quaternion orientation representations
//!
//! The trigonometric core of both conversions operates in radians only.
//! Sentence angles arrive in degrees; callers convert at the boundary with
//! [`EulerAngles::from_degrees`] before invoking the quaternion formula.

use serde::{Deserialize, Serialize};

/// Roll/pitch/yaw rotation, stored in radians (Z-Y-X convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    /// Build from radian-valued angles.
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// The explicit degree boundary: converts degree-valued sentence angles
    /// into the radian domain the conversion formulas require.
    pub fn from_degrees(roll_deg: f64, pitch_deg: f64, yaw_deg: f64) -> Self {
        Self {
            roll: roll_deg.to_radians(),
            pitch: pitch_deg.to_radians(),
            yaw: yaw_deg.to_radians(),
        }
    }

    /// Angles as (roll, pitch, yaw) degrees.
    pub fn to_degrees(&self) -> (f64, f64, f64) {
        (
            self.roll.to_degrees(),
            self.pitch.to_degrees(),
            self.yaw.to_degrees(),
        )
    }
}

/// Unit quaternion (w, x, y, z) rotation representation.
///
/// Conversion from Euler angles yields a unit-norm quaternion by
/// construction; the result is never re-normalized afterwards, so a norm
/// drifting from 1 is a conversion defect rather than something to paper
/// over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Convert radian-valued Euler angles (Z-Y-X / yaw-pitch-roll
    /// convention) via the half-angle product formula.
    pub fn from_euler(angles: EulerAngles) -> Self {
        let cy = (angles.yaw * 0.5).cos();
        let sy = (angles.yaw * 0.5).sin();
        let cp = (angles.pitch * 0.5).cos();
        let sp = (angles.pitch * 0.5).sin();
        let cr = (angles.roll * 0.5).cos();
        let sr = (angles.roll * 0.5).sin();

        Self {
            w: cr * cp * cy + sr * sp * sy,
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
        }
    }

    /// Inverse conversion, used by downstream analysis consumers.
    ///
    /// The `asin` argument is clamped to [-1, 1]: near gimbal lock,
    /// rounding can push it just outside the domain.
    pub fn to_euler(&self) -> EulerAngles {
        let roll = f64::atan2(
            2.0 * (self.w * self.x + self.y * self.z),
            1.0 - 2.0 * (self.x * self.x + self.y * self.y),
        );

        let sin_pitch = (2.0 * (self.w * self.y - self.z * self.x)).clamp(-1.0, 1.0);
        let pitch = sin_pitch.asin();

        let yaw = f64::atan2(
            2.0 * (self.w * self.z + self.x * self.y),
            1.0 - 2.0 * (self.y * self.y + self.z * self.z),
        );

        EulerAngles { roll, pitch, yaw }
    }

    /// Inverse conversion reported in degrees, as (roll, pitch, yaw).
    pub fn to_euler_degrees(&self) -> (f64, f64, f64) {
        self.to_euler().to_degrees()
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise equality within a tolerance.
    pub fn approx_eq(&self, other: &Quaternion, tol: f64) -> bool {
        (self.w - other.w).abs() <= tol
            && (self.x - other.x).abs() <= tol
            && (self.y - other.y).abs() <= tol
            && (self.z - other.z).abs() <= tol
    }
}

impl From<EulerAngles> for Quaternion {
    fn from(angles: EulerAngles) -> Self {
        Quaternion::from_euler(angles)
    }
}
