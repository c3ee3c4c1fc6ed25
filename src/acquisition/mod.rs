//! Acquisition loop and published-record boundary

pub mod runner;
pub mod sink;

pub use runner::{
    AcquisitionLoop, CycleOutcome, FatalCause, LoopState, RejectCause, SessionReport,
};
pub use sink::{JsonLineSink, MemorySink, RecordSink};
