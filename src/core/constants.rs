//! Protocol constants for the VectorNav sentence interface

/// Sentence tag that must appear in every accepted line.
pub const SENTENCE_TAG: &str = "$VNYMR";

/// Minimum number of comma-separated fields in a complete sentence
/// (tag + 3 angles + 3 magnetic + 3 acceleration + 3 angular velocity).
pub const MIN_SENTENCE_FIELDS: usize = 13;

/// Field indices after splitting a sentence on `,`. Angles arrive in
/// yaw/pitch/roll order and are reassigned by name on assembly.
pub const FIELD_YAW: usize = 1;
pub const FIELD_PITCH: usize = 2;
pub const FIELD_ROLL: usize = 3;
pub const FIELD_MAG_X: usize = 4;
pub const FIELD_ACCEL_X: usize = 7;
pub const FIELD_GYRO_X: usize = 10;

/// Register write asserting the device's output rate, issued once per
/// acquisition cycle. No acknowledgment is awaited.
pub const OUTPUT_RATE_COMMAND: &[u8] = b"$VNWRG,07,40*XX";

/// Serial line rate of the reference device.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Bound on a single blocking line read (milliseconds).
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;

/// Reference-frame label stamped on every record.
pub const DEFAULT_FRAME_ID: &str = "IMU1_Frame";

/// Runtime guard on the quaternion norm after Euler conversion. A norm
/// outside this band indicates a conversion defect and ends the session.
pub const UNIT_NORM_TOLERANCE: f64 = 1e-6;
