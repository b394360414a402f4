//! Frame types

/// A captured frame borrowed from its source for the duration of one decode
///
/// `caplen` is the number of bytes actually captured and is the only bound the
/// decoder reads against. `len` is the on-wire length, which exceeds `caplen`
/// when the snapshot length truncated the frame; it is used for reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    data: &'a [u8],
    caplen: u32,
    len: u32,
}

impl<'a> RawFrame<'a> {
    /// Create a frame with explicit captured and on-wire lengths
    pub fn new(data: &'a [u8], caplen: u32, len: u32) -> Self {
        Self { data, caplen, len }
    }

    /// Create a frame whose captured and wire lengths equal the buffer length
    pub fn from_bytes(data: &'a [u8]) -> Self {
        let caplen = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            data,
            caplen,
            len: caplen,
        }
    }

    /// Captured bytes, clamped to whichever of `caplen` and the buffer is shorter
    pub fn bytes(&self) -> &'a [u8] {
        let end = (self.caplen as usize).min(self.data.len());
        &self.data[..end]
    }

    /// Number of bytes captured
    pub fn caplen(&self) -> u32 {
        self.caplen
    }

    /// Number of bytes on the wire
    pub fn wire_len(&self) -> u32 {
        self.len
    }

    /// Whether the snapshot length cut this frame short
    pub fn is_truncated(&self) -> bool {
        self.len > self.caplen
    }
}

/// An owned frame, kept when a frame has to outlive its capture buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Captured bytes
    pub data: Vec<u8>,
    /// On-wire length (may exceed `data.len()` if truncated)
    pub wire_len: u32,
}

impl CapturedFrame {
    /// Create a new, untruncated frame
    pub fn new(data: Vec<u8>) -> Self {
        let wire_len = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self { data, wire_len }
    }

    /// Create a frame that the snapshot length cut short of `wire_len`
    pub fn truncated(data: Vec<u8>, wire_len: u32) -> Self {
        Self { data, wire_len }
    }

    /// Borrow this frame for decoding
    pub fn as_raw(&self) -> RawFrame<'_> {
        let caplen = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
        RawFrame::new(&self.data, caplen, self.wire_len)
    }

    /// Get captured length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if frame is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_caplen_bounds_bytes() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let frame = RawFrame::new(&data, 4, 60);
        assert_eq!(frame.bytes(), &[1, 2, 3, 4]);
        assert!(frame.is_truncated());
        assert_eq!(frame.wire_len(), 60);
    }

    #[test]
    fn test_raw_frame_caplen_beyond_buffer() {
        let data = [1u8, 2, 3];
        let frame = RawFrame::new(&data, 1500, 1500);
        assert_eq!(frame.bytes(), &[1, 2, 3]);
        assert!(!frame.is_truncated());
    }

    #[test]
    fn test_captured_frame_as_raw() {
        let frame = CapturedFrame::truncated(vec![0xAA; 54], 1514);

        let raw = frame.as_raw();
        assert_eq!(raw.caplen(), 54);
        assert_eq!(raw.wire_len(), 1514);
        assert_eq!(raw.bytes().len(), 54);
        assert_eq!(frame.len(), 54);
        assert!(!frame.is_empty());
        assert!(raw.is_truncated());
        assert!(!CapturedFrame::new(vec![0; 60]).as_raw().is_truncated());
    }
}
