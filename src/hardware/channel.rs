//! Line transport abstraction
//!
//! One trait covers the real serial port and the mock used in tests. The
//! transport deals in whole text lines; byte framing stays below this
//! boundary.

use crate::core::constants::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS};
use crate::hardware::error::{ChannelError, ChannelResult};
use crate::hardware::RawLine;
use serde::{Deserialize, Serialize};

/// Byte-level transport presenting line-oriented framing.
pub trait LineTransport {
    /// Block for at most the configured read timeout waiting for one
    /// complete line.
    ///
    /// Returns `Ok(Some(line))` when a line arrived, `Ok(None)` when the
    /// timeout expired without one (never fatal), and `Err` on a transport
    /// fault.
    fn read_line(&mut self) -> ChannelResult<Option<RawLine>>;

    /// Best-effort command write toward the device. No response is read.
    fn write_command(&mut self, command: &[u8]) -> ChannelResult<()>;

    /// Current channel counters and connection state.
    fn status(&self) -> ChannelStatus;

    fn is_connected(&self) -> bool;

    /// Release the underlying handle. Subsequent reads and writes fail with
    /// `ConnectionLost`.
    fn close(&mut self);
}

/// Serial channel parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub port: String,
    /// Line rate in baud.
    pub baud_rate: u32,
    /// Bound on a single blocking line read (milliseconds).
    pub read_timeout_ms: u64,
}

impl ChannelConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout_ms(mut self, read_timeout_ms: u64) -> Self {
        self.read_timeout_ms = read_timeout_ms;
        self
    }

    pub fn validate(&self) -> ChannelResult<()> {
        if self.port.is_empty() {
            return Err(ChannelError::InvalidConfig {
                parameter: "port".to_string(),
                value: "<empty>".to_string(),
            });
        }
        if self.baud_rate == 0 {
            return Err(ChannelError::InvalidConfig {
                parameter: "baud_rate".to_string(),
                value: self.baud_rate.to_string(),
            });
        }
        if self.read_timeout_ms == 0 {
            return Err(ChannelError::InvalidConfig {
                parameter: "read_timeout_ms".to_string(),
                value: self.read_timeout_ms.to_string(),
            });
        }
        Ok(())
    }
}

/// Channel observability counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStatus {
    pub connected: bool,
    pub lines_read: u64,
    pub commands_written: u64,
    pub error_count: u64,
    /// Receive timestamp of the most recent line, microseconds since epoch.
    pub last_line_time_us: Option<u64>,
}

impl ChannelStatus {
    pub fn new() -> Self {
        Self {
            connected: false,
            lines_read: 0,
            commands_written: 0,
            error_count: 0,
            last_line_time_us: None,
        }
    }
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self::new()
    }
}
