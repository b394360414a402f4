//! Record sink abstraction
//!
//! The read loop hands every decode outcome to a [`RecordSink`]. Formatting
//! and printing belong to the sink, never to the decoder.

use crate::decoder::DecodedFrame;
use crate::skip::SkipReason;

/// Consumer of decode outcomes
pub trait RecordSink {
    /// A frame decoded down to its TCP payload
    fn record(&mut self, frame: &DecodedFrame<'_>);

    /// A frame the decoder passed over
    fn skip(&mut self, reason: SkipReason);

    /// Whether the sink can no longer accept records
    ///
    /// The read loop stops pulling frames once this returns `true`.
    fn is_closed(&self) -> bool {
        false
    }

    /// Called once when the read loop ends
    fn finish(&mut self) {}
}

/// Route one decode outcome to a sink
pub fn dispatch<S: RecordSink + ?Sized>(
    sink: &mut S,
    outcome: &Result<DecodedFrame<'_>, SkipReason>,
) {
    match outcome {
        Ok(frame) => sink.record(frame),
        Err(reason) => sink.skip(*reason),
    }
}

/// Sink that counts outcomes and keeps nothing else
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CountingSink {
    pub decoded: u64,
    pub skipped: [u64; SkipReason::ALL.len()],
    pub finished: bool,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips recorded for one reason
    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped[reason.index()]
    }

    /// Skips recorded for every reason
    pub fn total_skipped(&self) -> u64 {
        self.skipped.iter().sum()
    }
}

impl RecordSink for CountingSink {
    fn record(&mut self, _frame: &DecodedFrame<'_>) {
        self.decoded += 1;
    }

    fn skip(&mut self, reason: SkipReason) {
        self.skipped[reason.index()] += 1;
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
