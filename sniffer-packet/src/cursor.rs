//! Bounds-checked read cursor
//!
//! Every header reader pulls its bytes through a [`ByteCursor`]. It is the
//! single place where a read is checked against the captured length, so no
//! reader can index past the end of a frame.

use thiserror::Error;

/// A read asked for more bytes than remain in the buffer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("read of {requested} bytes at offset {offset} exceeds {remaining} remaining")]
pub struct OutOfBounds {
    /// Cursor offset at the time of the read
    pub offset: usize,
    /// Bytes the read needed
    pub requested: usize,
    /// Bytes that were left
    pub remaining: usize,
}

/// Read cursor over a fixed-length byte slice
///
/// Multi-byte reads are big-endian. The offset only moves when a read
/// succeeds, so a failed read leaves the cursor where it was.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left between the offset and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// The unread tail of the buffer, without advancing
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.offset..]
    }

    /// Borrow the next `n` bytes and advance past them
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], OutOfBounds> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(OutOfBounds {
                offset: self.offset,
                requested: n,
                remaining,
            });
        }
        let start = self.offset;
        self.offset += n;
        Ok(&self.buf[start..self.offset])
    }

    /// Read exactly `N` bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Skip `n` bytes
    pub fn advance(&mut self, n: usize) -> Result<(), OutOfBounds> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, OutOfBounds> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, OutOfBounds> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u8().unwrap(), 0x12);
        assert_eq!(cursor.read_u16_be().unwrap(), 0x3456);
        assert_eq!(cursor.read_u32_be().unwrap(), 0x789A_BCDE);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_failed_read_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = ByteCursor::new(&data);
        cursor.advance(1).unwrap();

        let err = cursor.read_u32_be().unwrap_err();
        assert_eq!(
            err,
            OutOfBounds {
                offset: 1,
                requested: 4,
                remaining: 2,
            }
        );
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_u16_be().unwrap(), 0x0203);
    }

    #[test]
    fn test_read_bytes_borrows_from_buffer() {
        let data = [1, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&data);

        let head = cursor.read_bytes(2).unwrap();
        assert_eq!(head, &[1, 2]);
        assert_eq!(cursor.rest(), &[3, 4, 5]);
        assert!(std::ptr::eq(head.as_ptr(), data.as_ptr()));
    }

    #[test]
    fn test_zero_length_reads() {
        let mut cursor = ByteCursor::new(&[]);
        assert_eq!(cursor.read_bytes(0).unwrap(), &[] as &[u8]);
        assert!(cursor.advance(0).is_ok());
        assert!(cursor.read_u8().is_err());
    }

    #[test]
    fn test_advance_past_end_fails() {
        let data = [0u8; 8];
        let mut cursor = ByteCursor::new(&data);
        assert!(cursor.advance(9).is_err());
        assert!(cursor.advance(usize::MAX).is_err());
        assert!(cursor.advance(8).is_ok());
        assert_eq!(cursor.remaining(), 0);
    }
}
