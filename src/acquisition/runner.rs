//! The read-parse-publish acquisition loop
//!
//! Strictly sequential: one owner of the channel and the sink, one record in
//! flight at most, records published in exact read order. A rejected line
//! skips the cycle; any transport fault or unclassified failure ends the
//! session. There is no retry, backoff, or silent reconnect.

use crate::acquisition::sink::RecordSink;
use crate::core::constants::{OUTPUT_RATE_COMMAND, UNIT_NORM_TOLERANCE};
use crate::hardware::channel::LineTransport;
use crate::hardware::error::ChannelError;
use crate::processing::assembler::RecordAssembler;
use crate::processing::parser::{ParseReject, SentenceParser};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Loop position, for observability. `Terminated` is the sole terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Reading,
    Parsing,
    Converting,
    Publishing,
    Terminated,
}

/// Why a cycle published nothing. Recovered locally; the loop continues.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectCause {
    /// The read timed out without a complete line.
    EmptyRead,
    /// The line failed sentence validation.
    Parse(ParseReject),
}

/// Why the session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FatalCause {
    /// Serial disconnect or I/O fault.
    Transport(ChannelError),
    /// The shutdown flag was raised between cycles.
    ShutdownRequested,
    /// Any other failure during a cycle.
    Internal(String),
}

/// Explicit result of one acquisition cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Published,
    Rejected(RejectCause),
    Fatal(FatalCause),
}

/// Final accounting for one acquisition session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub cause: FatalCause,
    pub lines_read: u64,
    pub records_published: u64,
    pub lines_rejected: u64,
}

impl SessionReport {
    /// True when the session ended by request rather than by failure.
    pub fn is_clean_shutdown(&self) -> bool {
        self.cause == FatalCause::ShutdownRequested
    }
}

/// Owns the transport handle and the decode pipeline; drives cycles until
/// the session terminates.
pub struct AcquisitionLoop {
    channel: Box<dyn LineTransport>,
    parser: SentenceParser,
    assembler: RecordAssembler,
    rate_command: Vec<u8>,
    shutdown: Arc<AtomicBool>,
    state: LoopState,
    lines_read: u64,
    records_published: u64,
    lines_rejected: u64,
}

impl AcquisitionLoop {
    pub fn new(
        channel: Box<dyn LineTransport>,
        parser: SentenceParser,
        assembler: RecordAssembler,
    ) -> Self {
        Self {
            channel,
            parser,
            assembler,
            rate_command: OUTPUT_RATE_COMMAND.to_vec(),
            shutdown: Arc::new(AtomicBool::new(false)),
            state: LoopState::Idle,
            lines_read: 0,
            records_published: 0,
            lines_rejected: 0,
        }
    }

    /// Override the per-cycle device-configuration command.
    pub fn with_rate_command(mut self, command: impl Into<Vec<u8>>) -> Self {
        self.rate_command = command.into();
        self
    }

    /// Flag checked between cycles; raising it terminates the session
    /// cleanly.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until the session terminates. The channel is closed exactly once
    /// on every termination path; no publish happens after termination.
    pub fn run(&mut self, sink: &mut dyn RecordSink) -> SessionReport {
        info!("acquisition session started");

        let cause = loop {
            match self.run_cycle(sink) {
                CycleOutcome::Published => {
                    self.records_published += 1;
                }
                CycleOutcome::Rejected(cause) => {
                    self.lines_rejected += 1;
                    debug!("cycle rejected: {:?}", cause);
                }
                CycleOutcome::Fatal(cause) => break cause,
            }
        };

        self.channel.close();
        self.state = LoopState::Terminated;

        match &cause {
            FatalCause::ShutdownRequested => info!("acquisition session shut down"),
            FatalCause::Transport(e) => error!("acquisition session lost transport: {}", e),
            FatalCause::Internal(details) => error!("acquisition session failed: {}", details),
        }

        SessionReport {
            cause,
            lines_read: self.lines_read,
            records_published: self.records_published,
            lines_rejected: self.lines_rejected,
        }
    }

    /// One cycle: read, assert the device output rate, parse, convert,
    /// publish.
    fn run_cycle(&mut self, sink: &mut dyn RecordSink) -> CycleOutcome {
        if self.shutdown.load(Ordering::Relaxed) {
            return CycleOutcome::Fatal(FatalCause::ShutdownRequested);
        }

        self.state = LoopState::Reading;
        let line = match self.channel.read_line() {
            Ok(line) => line,
            Err(e) => return CycleOutcome::Fatal(FatalCause::Transport(e)),
        };

        // Scheduled side effect, once per cycle regardless of what the read
        // produced.
        if let Some(outcome) = self.assert_output_rate() {
            return outcome;
        }

        let raw = match line {
            Some(raw) => raw,
            None => return CycleOutcome::Rejected(RejectCause::EmptyRead),
        };
        self.lines_read += 1;

        self.state = LoopState::Parsing;
        let sentence = match self.parser.parse(&raw.text) {
            Ok(sentence) => sentence,
            Err(reject) => return CycleOutcome::Rejected(RejectCause::Parse(reject)),
        };

        self.state = LoopState::Converting;
        let record = self.assembler.assemble(&sentence, raw.timestamp_us);

        // Orientation data must never be silently corrupted: a non-unit
        // quaternion out of the conversion is a defect, not a skippable
        // sample.
        let norm = record.orientation.norm();
        if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return CycleOutcome::Fatal(FatalCause::Internal(format!(
                "non-unit quaternion (norm {}) converted from line {:?}",
                norm, raw.text
            )));
        }

        self.state = LoopState::Publishing;
        sink.publish(record);
        CycleOutcome::Published
    }

    /// Write the fixed output-rate register command. No acknowledgment is
    /// awaited, so a pure write timeout is logged and skipped; any other
    /// transport fault ends the session.
    fn assert_output_rate(&mut self) -> Option<CycleOutcome> {
        match self.channel.write_command(&self.rate_command) {
            Ok(()) => None,
            Err(e) if !e.is_fatal() => {
                warn!("output-rate command skipped: {}", e);
                None
            }
            Err(e) => Some(CycleOutcome::Fatal(FatalCause::Transport(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::sink::MemorySink;
    use crate::core::constants::DEFAULT_FRAME_ID;
    use crate::hardware::mock::MockChannel;
    use std::sync::atomic::Ordering;

    const LINE_A: &str =
        "$VNYMR,10.0,5.0,1.0,0.1,0.2,0.3,0.01,0.02,9.8,0.001,0.002,0.003*6A";
    const LINE_B: &str =
        "$VNYMR,20.0,-5.0,2.0,0.4,0.5,0.6,0.03,0.04,9.7,0.004,0.005,0.006*6A";

    fn runner_with(channel: MockChannel) -> AcquisitionLoop {
        AcquisitionLoop::new(
            Box::new(channel),
            SentenceParser::new(),
            RecordAssembler::new(DEFAULT_FRAME_ID),
        )
    }

    fn run_to_termination(channel: MockChannel) -> (SessionReport, MemorySink, AcquisitionLoop) {
        let mut runner = runner_with(channel);
        let mut sink = MemorySink::new();
        let report = runner.run(&mut sink);
        (report, sink, runner)
    }

    #[test]
    fn test_publishes_records_in_read_order() {
        let mut channel = MockChannel::new();
        channel.push_lines([LINE_A, LINE_B]);
        channel.fail_when_drained();

        let (report, sink, _) = run_to_termination(channel);

        assert_eq!(report.records_published, 2);
        assert_eq!(sink.len(), 2);
        // Yaw 10 then yaw 20, in read order.
        let (_, _, yaw_a) = sink.records()[0].orientation.to_euler_degrees();
        let (_, _, yaw_b) = sink.records()[1].orientation.to_euler_degrees();
        assert!((yaw_a - 10.0).abs() < 1e-6);
        assert!((yaw_b - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_transport_failure_terminates_session() {
        let mut channel = MockChannel::new();
        channel.push_line(LINE_A);
        channel.fail_when_drained();

        let (report, sink, runner) = run_to_termination(channel);

        assert_eq!(runner.state(), LoopState::Terminated);
        assert!(matches!(report.cause, FatalCause::Transport(_)));
        // Nothing published after the failure.
        assert_eq!(sink.len(), 1);
        assert_eq!(report.records_published, 1);
    }

    #[test]
    fn test_channel_closed_exactly_once() {
        // The loop owns the channel, so closure is observed through a probe
        // that shares the mock's counters.
        struct Probe {
            inner: MockChannel,
        }
        impl LineTransport for Probe {
            fn read_line(&mut self) -> crate::hardware::ChannelResult<Option<crate::hardware::RawLine>> {
                self.inner.read_line()
            }
            fn write_command(&mut self, command: &[u8]) -> crate::hardware::ChannelResult<()> {
                self.inner.write_command(command)
            }
            fn status(&self) -> crate::hardware::ChannelStatus {
                self.inner.status()
            }
            fn is_connected(&self) -> bool {
                self.inner.is_connected()
            }
            fn close(&mut self) {
                self.inner.close();
                assert_eq!(self.inner.close_count(), 1, "channel closed more than once");
            }
        }

        let mut mock = MockChannel::new();
        mock.push_line(LINE_A);
        mock.fail_when_drained();

        let mut runner = AcquisitionLoop::new(
            Box::new(Probe { inner: mock }),
            SentenceParser::new(),
            RecordAssembler::new(DEFAULT_FRAME_ID),
        );
        let mut sink = MemorySink::new();
        let report = runner.run(&mut sink);

        assert!(matches!(report.cause, FatalCause::Transport(_)));
        assert_eq!(runner.state(), LoopState::Terminated);
    }

    #[test]
    fn test_rejected_lines_skipped_silently() {
        let mut channel = MockChannel::new();
        channel.push_lines(["garbage line", LINE_A, "$VNYMR,too,short"]);
        channel.fail_when_drained();

        let (report, sink, _) = run_to_termination(channel);

        assert_eq!(report.records_published, 1);
        assert_eq!(report.lines_rejected, 2);
        assert_eq!(report.lines_read, 3);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_rate_command_written_every_cycle() {
        let mut channel = MockChannel::new();
        channel.push_lines([LINE_A, "garbage", LINE_B]);
        channel.fail_when_drained();

        struct Probe {
            inner: MockChannel,
        }
        impl LineTransport for Probe {
            fn read_line(&mut self) -> crate::hardware::ChannelResult<Option<crate::hardware::RawLine>> {
                self.inner.read_line()
            }
            fn write_command(&mut self, command: &[u8]) -> crate::hardware::ChannelResult<()> {
                assert_eq!(command, OUTPUT_RATE_COMMAND);
                self.inner.write_command(command)
            }
            fn status(&self) -> crate::hardware::ChannelStatus {
                self.inner.status()
            }
            fn is_connected(&self) -> bool {
                self.inner.is_connected()
            }
            fn close(&mut self) {
                // Three successful reads happened, fatal came on the fourth,
                // so exactly three command writes were issued.
                assert_eq!(self.inner.status().commands_written, 3);
                self.inner.close();
            }
        }

        let mut runner = AcquisitionLoop::new(
            Box::new(Probe { inner: channel }),
            SentenceParser::new(),
            RecordAssembler::new(DEFAULT_FRAME_ID),
        );
        let mut sink = MemorySink::new();
        let report = runner.run(&mut sink);
        assert_eq!(report.records_published, 2);
        assert_eq!(report.lines_rejected, 1);
    }

    #[test]
    fn test_shutdown_flag_terminates_cleanly() {
        let mut channel = MockChannel::new();
        channel.push_line(LINE_A);

        let mut runner = runner_with(channel);
        runner.shutdown_flag().store(true, Ordering::Relaxed);

        let mut sink = MemorySink::new();
        let report = runner.run(&mut sink);

        assert!(report.is_clean_shutdown());
        assert_eq!(report.records_published, 0);
        assert!(sink.is_empty());
        assert_eq!(runner.state(), LoopState::Terminated);
    }

    #[test]
    fn test_empty_reads_do_not_terminate() {
        // Two read timeouts, then a valid line, then the scripted failure.
        let mut channel = MockChannel::new();
        channel.push_timeout();
        channel.push_timeout();
        channel.push_line(LINE_A);
        channel.fail_when_drained();

        let (report, sink, _) = run_to_termination(channel);

        assert_eq!(report.records_published, 1);
        assert_eq!(report.lines_rejected, 2);
        assert_eq!(report.lines_read, 1);
        assert_eq!(sink.len(), 1);
        assert!(matches!(report.cause, FatalCause::Transport(_)));
    }

    #[test]
    fn test_write_timeout_is_not_fatal() {
        struct WriteTimeout {
            inner: MockChannel,
        }
        impl LineTransport for WriteTimeout {
            fn read_line(&mut self) -> crate::hardware::ChannelResult<Option<crate::hardware::RawLine>> {
                self.inner.read_line()
            }
            fn write_command(&mut self, _command: &[u8]) -> crate::hardware::ChannelResult<()> {
                Err(ChannelError::Timeout { timeout_ms: 2000 })
            }
            fn status(&self) -> crate::hardware::ChannelStatus {
                self.inner.status()
            }
            fn is_connected(&self) -> bool {
                self.inner.is_connected()
            }
            fn close(&mut self) {
                self.inner.close();
            }
        }

        let mut mock = MockChannel::new();
        mock.push_line(LINE_A);
        mock.fail_when_drained();

        let mut runner = AcquisitionLoop::new(
            Box::new(WriteTimeout { inner: mock }),
            SentenceParser::new(),
            RecordAssembler::new(DEFAULT_FRAME_ID),
        );
        let mut sink = MemorySink::new();
        let report = runner.run(&mut sink);

        // The timed-out command is skipped; the line still publishes.
        assert_eq!(report.records_published, 1);
        assert!(matches!(report.cause, FatalCause::Transport(_)));
    }
}
