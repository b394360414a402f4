//! Frame source abstraction
//!
//! The capture read loop pulls one frame at a time from a [`FrameSource`].
//! Frames are borrowed from the source and must be consumed before the next
//! call.

use crate::packet::{CapturedFrame, RawFrame};
use crate::Result;
use std::collections::VecDeque;

/// Supplier of captured frames
pub trait FrameSource {
    /// Block until the next frame is available.
    ///
    /// Returns `Ok(None)` once the source is exhausted. Read timeouts are
    /// handled inside the source and never surface here.
    fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>>;
}

/// In-memory frame source, used for replaying frames and in tests
#[derive(Debug, Default)]
pub struct MemorySource {
    pending: VecDeque<CapturedFrame>,
    current: Option<CapturedFrame>,
}

impl MemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source that yields each buffer once, in order
    pub fn from_buffers<I>(buffers: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let pending = buffers
            .into_iter()
            .map(CapturedFrame::new)
            .collect();
        Self {
            pending,
            current: None,
        }
    }

    /// Queue another frame
    pub fn push(&mut self, frame: CapturedFrame) {
        self.pending.push_back(frame);
    }

    /// Number of frames not yet handed out
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>> {
        self.current = self.pending.pop_front();
        Ok(self.current.as_ref().map(CapturedFrame::as_raw))
    }
}
