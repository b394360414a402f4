//! Internet checksum (RFC 1071)
//!
//! Used to verify IPv4 header checksums and TCP checksums of decoded frames,
//! and to fill them in when frames are synthesised.

/// Running one's-complement sum over one or more byte slices
///
/// Slices may have odd lengths; a trailing odd byte is paired with the first
/// byte of the next slice, so feeding a buffer in pieces gives the same result
/// as feeding it whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checksum {
    sum: u32,
    pending: Option<u8>,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes to the sum
    pub fn add(mut self, data: &[u8]) -> Self {
        let mut data = data;
        if let Some(high) = self.pending.take() {
            match data.split_first() {
                Some((&low, rest)) => {
                    self.add_word(u16::from_be_bytes([high, low]));
                    data = rest;
                }
                None => {
                    self.pending = Some(high);
                    return self;
                }
            }
        }

        let mut chunks = data.chunks_exact(2);
        for chunk in &mut chunks {
            self.add_word(u16::from_be_bytes([chunk[0], chunk[1]]));
        }
        self.pending = chunks.remainder().first().copied();
        self
    }

    fn add_word(&mut self, word: u16) {
        self.sum += u32::from(word);
        // Fold early so the sum never overflows
        if self.sum > 0xFFFF {
            self.sum = (self.sum & 0xFFFF) + (self.sum >> 16);
        }
    }

    /// Fold and complement the sum
    pub fn finish(mut self) -> u16 {
        if let Some(high) = self.pending.take() {
            self.add_word(u16::from_be_bytes([high, 0]));
        }
        while (self.sum >> 16) != 0 {
            self.sum = (self.sum & 0xFFFF) + (self.sum >> 16);
        }
        !(self.sum as u16)
    }
}

/// Calculates the Internet Checksum of `data`.
///
/// Over a header that already carries its checksum, the result is 0.
pub fn internet_checksum(data: &[u8]) -> u16 {
    Checksum::new().add(data).finish()
}

/// Calculates a TCP or UDP checksum including the IPv4 pseudo-header.
///
/// `segment` holds the transport header and data, possibly split across
/// several slices.
pub fn transport_checksum(
    src_ip: &[u8; 4],
    dst_ip: &[u8; 4],
    protocol: u8,
    segment: &[&[u8]],
) -> u16 {
    let length: usize = segment.iter().map(|part| part.len()).sum();
    let pseudo = Checksum::new()
        .add(src_ip)
        .add(dst_ip)
        .add(&[0, protocol])
        .add(&(length as u16).to_be_bytes());
    segment
        .iter()
        .fold(pseudo, |sum, part| sum.add(part))
        .finish()
}
