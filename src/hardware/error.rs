//! Transport error types

use std::fmt;

/// Failures of the serial transport.
///
/// A read timeout is not represented here: it surfaces as an empty read
/// (`Ok(None)`) and is handled by the parser path. `Timeout` covers explicit
/// write timeouts only.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// The device disappeared or the handle was closed.
    ConnectionLost { port: String },
    /// A write did not complete within the port timeout.
    Timeout { timeout_ms: u64 },
    /// Any other I/O fault reported by the operating system.
    Io { operation: String, message: String },
    /// Rejected channel configuration.
    InvalidConfig { parameter: String, value: String },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::ConnectionLost { port } => {
                write!(f, "connection lost on {}", port)
            }
            ChannelError::Timeout { timeout_ms } => {
                write!(f, "write timed out after {}ms", timeout_ms)
            }
            ChannelError::Io { operation, message } => {
                write!(f, "I/O error during {}: {}", operation, message)
            }
            ChannelError::InvalidConfig { parameter, value } => {
                write!(f, "invalid channel configuration: {} = {}", parameter, value)
            }
        }
    }
}

impl std::error::Error for ChannelError {}

impl ChannelError {
    /// Whether this error ends the acquisition session. Only a bare write
    /// timeout is tolerable: the rate command awaits no acknowledgment.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ChannelError::Timeout { .. })
    }
}

/// Result type for transport operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
