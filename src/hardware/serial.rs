//! Serial port transport for the IMU's line protocol

use crate::hardware::channel::{ChannelConfig, ChannelStatus, LineTransport};
use crate::hardware::error::{ChannelError, ChannelResult};
use crate::hardware::{now_us, RawLine};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// `LineTransport` over a real serial port.
///
/// Bytes are accumulated into an internal buffer and handed out one
/// `\n`-terminated line at a time; a partial line survives a read timeout
/// and completes on a later cycle.
pub struct SerialChannel {
    port: Option<Box<dyn serialport::SerialPort>>,
    config: ChannelConfig,
    status: ChannelStatus,
    read_buffer: Vec<u8>,
}

impl SerialChannel {
    /// Open the configured port. Fails fast on invalid configuration or an
    /// unopenable device.
    pub fn open(config: ChannelConfig) -> ChannelResult<Self> {
        config.validate()?;

        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|e| ChannelError::Io {
                operation: "open".to_string(),
                message: e.to_string(),
            })?;

        let mut status = ChannelStatus::new();
        status.connected = true;

        Ok(Self {
            port: Some(port),
            config,
            status,
            read_buffer: Vec::with_capacity(256),
        })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    fn connection_lost(&mut self) -> ChannelError {
        self.status.connected = false;
        self.port = None;
        ChannelError::ConnectionLost {
            port: self.config.port.clone(),
        }
    }

    /// Pop one complete line off the buffer, if present. The terminator and
    /// any trailing `\r` are stripped.
    fn take_buffered_line(&mut self) -> Option<String> {
        let newline = self.read_buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.read_buffer.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl LineTransport for SerialChannel {
    fn read_line(&mut self) -> ChannelResult<Option<RawLine>> {
        loop {
            if let Some(text) = self.take_buffered_line() {
                let line = RawLine::new(text, now_us());
                self.status.lines_read += 1;
                self.status.last_line_time_us = Some(line.timestamp_us);
                return Ok(Some(line));
            }

            let port = match self.port.as_mut() {
                Some(port) => port,
                None => return Err(self.connection_lost()),
            };

            let mut chunk = [0u8; 256];
            match port.read(&mut chunk) {
                // EOF: the device went away.
                Ok(0) => return Err(self.connection_lost()),
                Ok(n) => self.read_buffer.extend_from_slice(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(None);
                }
                Err(e) if matches!(e.kind(), ErrorKind::BrokenPipe | ErrorKind::NotConnected) => {
                    self.status.error_count += 1;
                    return Err(self.connection_lost());
                }
                Err(e) => {
                    self.status.error_count += 1;
                    return Err(ChannelError::Io {
                        operation: "read".to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    fn write_command(&mut self, command: &[u8]) -> ChannelResult<()> {
        let timeout_ms = self.config.read_timeout_ms;
        let port = match self.port.as_mut() {
            Some(port) => port,
            None => return Err(self.connection_lost()),
        };

        match port.write_all(command) {
            Ok(()) => {
                self.status.commands_written += 1;
                Ok(())
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                self.status.error_count += 1;
                Err(ChannelError::Timeout { timeout_ms })
            }
            Err(e) if matches!(e.kind(), ErrorKind::BrokenPipe | ErrorKind::NotConnected) => {
                self.status.error_count += 1;
                Err(self.connection_lost())
            }
            Err(e) => {
                self.status.error_count += 1;
                Err(ChannelError::Io {
                    operation: "write".to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    fn status(&self) -> ChannelStatus {
        self.status.clone()
    }

    fn is_connected(&self) -> bool {
        self.status.connected && self.port.is_some()
    }

    fn close(&mut self) {
        self.port = None;
        self.status.connected = false;
        self.read_buffer.clear();
    }
}
