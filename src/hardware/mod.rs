//! Serial transport layer

pub mod channel;
pub mod error;
pub mod mock;
pub mod serial;

pub use channel::{ChannelConfig, ChannelStatus, LineTransport};
pub use error::{ChannelError, ChannelResult};
pub use mock::MockChannel;
pub use serial::SerialChannel;

use std::time::{SystemTime, UNIX_EPOCH};

/// One transport frame: the text of a line and its receive timestamp.
/// Ephemeral, discarded after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub text: String,
    /// Microseconds since the Unix epoch at receipt.
    pub timestamp_us: u64,
}

impl RawLine {
    pub fn new(text: impl Into<String>, timestamp_us: u64) -> Self {
        Self {
            text: text.into(),
            timestamp_us,
        }
    }

    /// Stamp a line with the current wall clock.
    pub fn stamped(text: impl Into<String>) -> Self {
        Self::new(text, now_us())
    }
}

/// Current wall clock in microseconds since the Unix epoch.
pub(crate) fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}
