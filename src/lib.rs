//! Serial IMU acquisition driver
//!
//! Acquires measurements from a serial-attached inertial measurement unit
//! speaking the VectorNav `$VNYMR` sentence protocol, converts Euler angles
//! to unit quaternions, and publishes one immutable timestamped record per
//! accepted line into a [`RecordSink`].
//!
//! The pipeline runs strictly sequentially, one direction per cycle:
//! bytes → line → field set → record → sink. Malformed lines are dropped
//! silently at sensor rate; any transport fault ends the session.

pub mod acquisition;
pub mod core;
pub mod hardware;
pub mod math;
pub mod processing;
pub mod utils;

// Re-export the types most consumers touch.
pub use crate::acquisition::{
    AcquisitionLoop, CycleOutcome, FatalCause, JsonLineSink, LoopState, MemorySink, RecordSink,
    RejectCause, SessionReport,
};
pub use crate::core::types::MeasurementRecord;
pub use crate::hardware::{
    ChannelConfig, ChannelError, ChannelResult, ChannelStatus, LineTransport, MockChannel,
    RawLine, SerialChannel,
};
pub use crate::math::orientation::{EulerAngles, Quaternion};
pub use crate::processing::{ParseReject, ParsedSentence, RecordAssembler, SentenceParser};
pub use crate::utils::config::{ConfigError, DriverConfig};
