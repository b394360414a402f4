//! TCP header decoding
//!
//! The TCP header is 20 to 60 bytes long, sized by the data-offset nibble.
//! Like the IPv4 reader, the offset is range-checked before it sizes the
//! options, and every byte comes through the bounds-checked cursor.

use crate::cursor::{ByteCursor, OutOfBounds};
use crate::skip::SkipReason;
use bytes::BufMut;
use std::fmt;

/// TCP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    /// FIN - No more data from sender
    pub fin: bool,
    /// SYN - Synchronize sequence numbers
    pub syn: bool,
    /// RST - Reset the connection
    pub rst: bool,
    /// PSH - Push function
    pub psh: bool,
    /// ACK - Acknowledgment field is significant
    pub ack: bool,
    /// URG - Urgent pointer field is significant
    pub urg: bool,
    /// ECE - ECN-Echo
    pub ece: bool,
    /// CWR - Congestion Window Reduced
    pub cwr: bool,
}

impl TcpFlags {
    /// SYN flag (connection initiation)
    pub const SYN: TcpFlags = TcpFlags::from_u8(0b0000_0010);

    /// SYN+ACK flags (connection acknowledgment)
    pub const SYN_ACK: TcpFlags = TcpFlags::from_u8(0b0001_0010);

    /// ACK flag
    pub const ACK: TcpFlags = TcpFlags::from_u8(0b0001_0000);

    /// PSH+ACK flags (push data)
    pub const PSH_ACK: TcpFlags = TcpFlags::from_u8(0b0001_1000);

    /// Convert flags to u8 value
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.fin {
            flags |= 0b00000001;
        }
        if self.syn {
            flags |= 0b00000010;
        }
        if self.rst {
            flags |= 0b00000100;
        }
        if self.psh {
            flags |= 0b00001000;
        }
        if self.ack {
            flags |= 0b00010000;
        }
        if self.urg {
            flags |= 0b00100000;
        }
        if self.ece {
            flags |= 0b01000000;
        }
        if self.cwr {
            flags |= 0b10000000;
        }
        flags
    }

    /// Parse flags from u8 value
    pub const fn from_u8(value: u8) -> Self {
        TcpFlags {
            fin: (value & 0b00000001) != 0,
            syn: (value & 0b00000010) != 0,
            rst: (value & 0b00000100) != 0,
            psh: (value & 0b00001000) != 0,
            ack: (value & 0b00010000) != 0,
            urg: (value & 0b00100000) != 0,
            ece: (value & 0b01000000) != 0,
            cwr: (value & 0b10000000) != 0,
        }
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.fin, "FIN"),
            (self.syn, "SYN"),
            (self.rst, "RST"),
            (self.psh, "PSH"),
            (self.ack, "ACK"),
            (self.urg, "URG"),
            (self.ece, "ECE"),
            (self.cwr, "CWR"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(set, _)| *set) {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(name)?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// One entry of the TCP options area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpOption<'a> {
    /// End of option list (kind 0)
    EndOfList,
    /// No-operation padding (kind 1)
    Nop,
    /// Maximum segment size (kind 2)
    Mss(u16),
    /// Window scale shift count (kind 3)
    WindowScale(u8),
    /// SACK permitted (kind 4)
    SackPermitted,
    /// SACK blocks as raw left/right edge pairs (kind 5)
    Sack(&'a [u8]),
    /// Timestamps (kind 8)
    Timestamps { value: u32, echo: u32 },
    /// Anything else, or a known kind with an unexpected length
    Unknown { kind: u8, data: &'a [u8] },
}

/// Iterator over TCP options
///
/// Stops after `EndOfList`, at the end of the area, or at the first option
/// whose length byte is missing, below 2, or runs past the area.
#[derive(Debug, Clone)]
pub struct TcpOptions<'a> {
    cursor: ByteCursor<'a>,
    done: bool,
}

impl<'a> TcpOptions<'a> {
    pub fn new(options: &'a [u8]) -> Self {
        TcpOptions {
            cursor: ByteCursor::new(options),
            done: false,
        }
    }

    fn next_option(&mut self) -> Result<TcpOption<'a>, OutOfBounds> {
        let kind = self.cursor.read_u8()?;
        match kind {
            0 => return Ok(TcpOption::EndOfList),
            1 => return Ok(TcpOption::Nop),
            _ => {}
        }

        let len = usize::from(self.cursor.read_u8()?);
        if len < 2 {
            // A length that cannot cover its own kind/length bytes
            return Err(OutOfBounds {
                offset: self.cursor.position(),
                requested: 2,
                remaining: len,
            });
        }
        let data = self.cursor.read_bytes(len - 2)?;
        let mut body = ByteCursor::new(data);

        let option = match (kind, data.len()) {
            (2, 2) => TcpOption::Mss(body.read_u16_be()?),
            (3, 1) => TcpOption::WindowScale(body.read_u8()?),
            (4, 0) => TcpOption::SackPermitted,
            (5, n) if n % 8 == 0 => TcpOption::Sack(data),
            (8, 8) => TcpOption::Timestamps {
                value: body.read_u32_be()?,
                echo: body.read_u32_be()?,
            },
            _ => TcpOption::Unknown { kind, data },
        };
        Ok(option)
    }
}

impl<'a> Iterator for TcpOptions<'a> {
    type Item = TcpOption<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.remaining() == 0 {
            return None;
        }
        match self.next_option() {
            Ok(TcpOption::EndOfList) => {
                self.done = true;
                Some(TcpOption::EndOfList)
            }
            Ok(option) => Some(option),
            Err(_) => {
                self.done = true;
                None
            }
        }
    }
}

/// Decoded TCP header
///
/// `options` borrows from the frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader<'a> {
    /// Source port
    pub src_port: u16,
    /// Destination port
    pub dst_port: u16,
    /// Sequence number
    pub seq: u32,
    /// Acknowledgment number
    pub ack: u32,
    /// Data offset in 32-bit words, 5..=15
    pub data_offset_words: u8,
    /// Reserved low nibble of byte 12
    pub reserved: u8,
    /// TCP flags
    pub flags: TcpFlags,
    /// Window size
    pub window: u16,
    /// Checksum as carried on the wire
    pub checksum: u16,
    /// Urgent pointer
    pub urgent_ptr: u16,
    /// Option bytes, `(data_offset_words - 5) * 4` long
    pub options: &'a [u8],
    pub(crate) raw: &'a [u8],
}

impl<'a> TcpHeader<'a> {
    /// Minimum TCP header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Maximum TCP header size (with maximum options)
    pub const MAX_HEADER_SIZE: usize = 60;

    /// Decode the header at the cursor, leaving it at the start of the payload
    pub fn read(cursor: &mut ByteCursor<'a>) -> Result<Self, SkipReason> {
        let mut start = *cursor;
        let short = |_: OutOfBounds| SkipReason::TooShortForTcp;

        if cursor.remaining() < Self::MIN_HEADER_SIZE {
            return Err(SkipReason::TooShortForTcp);
        }

        let src_port = cursor.read_u16_be().map_err(short)?;
        let dst_port = cursor.read_u16_be().map_err(short)?;
        let seq = cursor.read_u32_be().map_err(short)?;
        let ack = cursor.read_u32_be().map_err(short)?;

        // Data offset (high nibble) and reserved bits (low nibble) share byte 12
        let offset_reserved = cursor.read_u8().map_err(short)?;
        let data_offset_words = offset_reserved >> 4;
        let reserved = offset_reserved & 0x0F;

        let flags = TcpFlags::from_u8(cursor.read_u8().map_err(short)?);
        let window = cursor.read_u16_be().map_err(short)?;
        let checksum = cursor.read_u16_be().map_err(short)?;
        let urgent_ptr = cursor.read_u16_be().map_err(short)?;

        if data_offset_words < 5 {
            return Err(SkipReason::InvalidTcpHeaderLength);
        }

        let header_len = usize::from(data_offset_words) * 4;
        let options = cursor
            .read_bytes(header_len - Self::MIN_HEADER_SIZE)
            .map_err(short)?;
        let raw = start.read_bytes(header_len).map_err(short)?;

        Ok(TcpHeader {
            src_port,
            dst_port,
            seq,
            ack,
            data_offset_words,
            reserved,
            flags,
            window,
            checksum,
            urgent_ptr,
            options,
            raw,
        })
    }

    /// Header size in bytes, options included
    pub fn header_len(&self) -> usize {
        usize::from(self.data_offset_words) * 4
    }

    /// Iterate over the options area
    pub fn option_iter(&self) -> TcpOptions<'a> {
        TcpOptions::new(self.options)
    }
}

/// Fields needed to encode a TCP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpFields {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    pub flags: TcpFlags,
    pub window: u16,
    pub urgent_ptr: u16,
    /// Option bytes; padded with zeros to a 4-byte boundary when written
    pub options: Vec<u8>,
}

impl TcpFields {
    pub fn new(src_port: u16, dst_port: u16) -> Self {
        TcpFields {
            src_port,
            dst_port,
            seq: 0,
            ack: 0,
            flags: TcpFlags::SYN,
            window: 65535,
            urgent_ptr: 0,
            options: Vec::new(),
        }
    }

    /// Header length in bytes once encoded
    pub fn header_len(&self) -> usize {
        TcpHeader::MIN_HEADER_SIZE + ((self.options.len() + 3) & !3)
    }

    /// Encode the header in wire order with the given checksum
    ///
    /// Fails without writing anything when the options exceed 40 bytes.
    pub fn write<B: BufMut>(&self, checksum: u16, buf: &mut B) -> sniffer_core::Result<()> {
        let header_len = self.header_len();
        if header_len > TcpHeader::MAX_HEADER_SIZE {
            return Err(sniffer_core::Error::PacketConstruction(format!(
                "TCP options exceed 40 bytes ({})",
                self.options.len()
            )));
        }
        buf.put_u16(self.src_port);
        buf.put_u16(self.dst_port);
        buf.put_u32(self.seq);
        buf.put_u32(self.ack);
        buf.put_u8(((header_len / 4) as u8) << 4);
        buf.put_u8(self.flags.to_u8());
        buf.put_u16(self.window);
        buf.put_u16(checksum);
        buf.put_u16(self.urgent_ptr);
        buf.put_slice(&self.options);
        buf.put_bytes(0, header_len - TcpHeader::MIN_HEADER_SIZE - self.options.len());
        Ok(())
    }
}
