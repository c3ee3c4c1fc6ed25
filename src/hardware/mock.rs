//! Mock transport for tests and development

use crate::hardware::channel::{ChannelStatus, LineTransport};
use crate::hardware::error::{ChannelError, ChannelResult};
use crate::hardware::{now_us, RawLine};
use std::collections::VecDeque;

/// Scripted read events: a line, or a timeout (empty read).
#[derive(Debug, Clone)]
enum ReadEvent {
    Line(String),
    Timeout,
}

/// Queue-backed `LineTransport`.
///
/// Reads pop scripted events in order; a drained queue reads as a timeout
/// (`Ok(None)`) unless the channel is scripted to fail when drained. Written
/// commands are captured for inspection and `close` invocations are counted.
pub struct MockChannel {
    events: VecDeque<ReadEvent>,
    written_commands: Vec<Vec<u8>>,
    connected: bool,
    fail_when_drained: bool,
    status: ChannelStatus,
    close_count: u32,
}

impl MockChannel {
    pub fn new() -> Self {
        let mut status = ChannelStatus::new();
        status.connected = true;

        Self {
            events: VecDeque::new(),
            written_commands: Vec::new(),
            connected: true,
            fail_when_drained: false,
            status,
            close_count: 0,
        }
    }

    /// Queue one line for a later read.
    pub fn push_line(&mut self, line: &str) {
        self.events.push_back(ReadEvent::Line(line.to_string()));
    }

    pub fn push_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.push_line(line);
        }
    }

    /// Queue one read that times out without a line.
    pub fn push_timeout(&mut self) {
        self.events.push_back(ReadEvent::Timeout);
    }

    /// Script a connection loss once every queued event has been consumed.
    pub fn fail_when_drained(&mut self) {
        self.fail_when_drained = true;
    }

    /// Drop the connection immediately.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.status.connected = false;
    }

    pub fn written_commands(&self) -> &[Vec<u8>] {
        &self.written_commands
    }

    pub fn close_count(&self) -> u32 {
        self.close_count
    }

    pub fn queued_events(&self) -> usize {
        self.events.len()
    }

    fn lost(&mut self) -> ChannelError {
        self.connected = false;
        self.status.connected = false;
        ChannelError::ConnectionLost {
            port: "mock".to_string(),
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTransport for MockChannel {
    fn read_line(&mut self) -> ChannelResult<Option<RawLine>> {
        if !self.connected {
            return Err(self.lost());
        }

        match self.events.pop_front() {
            Some(ReadEvent::Line(text)) => {
                let line = RawLine::new(text, now_us());
                self.status.lines_read += 1;
                self.status.last_line_time_us = Some(line.timestamp_us);
                Ok(Some(line))
            }
            Some(ReadEvent::Timeout) => Ok(None),
            None if self.fail_when_drained => Err(self.lost()),
            None => Ok(None),
        }
    }

    fn write_command(&mut self, command: &[u8]) -> ChannelResult<()> {
        if !self.connected {
            return Err(self.lost());
        }
        self.written_commands.push(command.to_vec());
        self.status.commands_written += 1;
        Ok(())
    }

    fn status(&self) -> ChannelStatus {
        self.status.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn close(&mut self) {
        self.close_count += 1;
        self.connected = false;
        self.status.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_queued_lines_in_order() {
        let mut channel = MockChannel::new();
        channel.push_lines(["first", "second"]);

        assert_eq!(channel.read_line().unwrap().unwrap().text, "first");
        assert_eq!(channel.read_line().unwrap().unwrap().text, "second");
        assert!(channel.read_line().unwrap().is_none());
        assert_eq!(channel.status().lines_read, 2);
    }

    #[test]
    fn test_scripted_timeout_reads_as_empty() {
        let mut channel = MockChannel::new();
        channel.push_timeout();
        channel.push_line("after");

        assert_eq!(channel.read_line(), Ok(None));
        assert_eq!(channel.read_line().unwrap().unwrap().text, "after");
        assert!(channel.is_connected());
    }

    #[test]
    fn test_fail_when_drained() {
        let mut channel = MockChannel::new();
        channel.push_line("only");
        channel.fail_when_drained();

        assert!(channel.read_line().unwrap().is_some());
        assert!(matches!(
            channel.read_line(),
            Err(ChannelError::ConnectionLost { .. })
        ));
        assert!(!channel.is_connected());
    }

    #[test]
    fn test_disconnect_fails_reads_and_writes() {
        let mut channel = MockChannel::new();
        channel.disconnect();

        assert!(channel.read_line().is_err());
        assert!(channel.write_command(b"cmd").is_err());
    }

    #[test]
    fn test_captures_written_commands() {
        let mut channel = MockChannel::new();
        channel.write_command(b"$VNWRG,07,40*XX").unwrap();

        assert_eq!(channel.written_commands().len(), 1);
        assert_eq!(channel.written_commands()[0], b"$VNWRG,07,40*XX");
        assert_eq!(channel.status().commands_written, 1);
    }

    #[test]
    fn test_counts_close_calls() {
        let mut channel = MockChannel::new();
        assert_eq!(channel.close_count(), 0);
        channel.close();
        assert_eq!(channel.close_count(), 1);
        assert!(!channel.is_connected());
    }
}
