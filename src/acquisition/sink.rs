//! Published-record boundary
//!
//! The loop hands each record to a sink exactly once, in read order, and
//! retains nothing. From the core's perspective the call is one-way and
//! non-blocking; transport semantics beyond that live downstream.

use crate::core::types::MeasurementRecord;
use log::warn;
use std::io::Write;

/// Downstream consumer of assembled records.
pub trait RecordSink {
    fn publish(&mut self, record: MeasurementRecord);
}

/// Vec-backed sink for tests and batch consumers.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<MeasurementRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<MeasurementRecord> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn publish(&mut self, record: MeasurementRecord) {
        self.records.push(record);
    }
}

/// Writes one JSON object per record per line; the binary's stdout sink.
pub struct JsonLineSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLineSink<W> {
    fn publish(&mut self, record: MeasurementRecord) {
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = writeln!(self.writer, "{}", json) {
                    warn!("record dropped, sink write failed: {}", e);
                }
            }
            Err(e) => warn!("record dropped, serialization failed: {}", e),
        }
    }
}
