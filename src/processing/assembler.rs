//! Record assembly from parsed sentences

use crate::core::types::MeasurementRecord;
use crate::math::orientation::{EulerAngles, Quaternion};
use crate::processing::parser::ParsedSentence;

/// Combines a parsed field set, the derived quaternion, and the acquisition
/// timestamp into one immutable record.
///
/// No failure path: assembly only runs on sentences that already parsed.
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    frame_id: String,
}

impl RecordAssembler {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
        }
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    /// Build one record. Sentence angles are degrees; this is the single
    /// point where they cross into the radian domain of the quaternion
    /// conversion.
    pub fn assemble(&self, sentence: &ParsedSentence, timestamp_us: u64) -> MeasurementRecord {
        let angles = EulerAngles::from_degrees(
            sentence.roll_deg,
            sentence.pitch_deg,
            sentence.yaw_deg,
        );

        MeasurementRecord {
            timestamp_us,
            frame_id: self.frame_id.clone(),
            orientation: Quaternion::from_euler(angles),
            angular_velocity: sentence.angular_velocity,
            linear_acceleration: sentence.linear_acceleration,
            magnetic_field: sentence.magnetic_field,
        }
    }
}
